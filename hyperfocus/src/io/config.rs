//! Service configuration stored in `hyperfocus.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::routing::RoutingKeywords;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "hyperfocus.toml";

/// Hyperfocus configuration (TOML).
///
/// Intended to be edited by humans. Missing fields default to values that
/// work against the public Mistral API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HyperfocusConfig {
    pub generation: GenerationConfig,
    pub prompts: PromptConfig,
    pub session: SessionConfig,
    pub memory: MemoryConfig,
    pub routing: RoutingKeywords,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Chat completions endpoint (Mistral or compatible).
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Model for the categorizer, energy advisor and guardian.
    pub small_model: String,
    /// Model for the coach and team answers.
    pub large_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on a single generation call, in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.mistral.ai/v1/chat/completions".to_string(),
            api_key_env: "MISTRAL_API_KEY".to_string(),
            small_model: "mistral-small-latest".to_string(),
            large_model: "mistral-large-latest".to_string(),
            temperature: 0.7,
            max_tokens: 512,
            timeout_secs: 30,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        let key = std::env::var(&self.api_key_env)
            .with_context(|| format!("read API key from ${}", self.api_key_env))?;
        if key.trim().is_empty() {
            return Err(anyhow!("${} is set but empty", self.api_key_env));
        }
        Ok(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PromptConfig {
    /// Byte budget for a rendered prompt; optional sections are dropped first.
    pub budget_bytes: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            budget_bytes: 8_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Session length when the caller does not pick one.
    pub default_target_minutes: u32,
    /// Wall-clock seconds per 10 minute check interval. Lower it to compress time in demos.
    pub tick_period_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_target_minutes: 25,
            tick_period_secs: 10 * 60,
        }
    }
}

impl SessionConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.tick_period_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MemoryConfig {
    /// Past exchanges per user replayed to the coach and team.
    pub history_turns: usize,
    /// Users whose history is kept; the least recently active is evicted beyond this.
    pub max_users: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            history_turns: 5,
            max_users: 1_000,
        }
    }
}

impl HyperfocusConfig {
    pub fn validate(&self) -> Result<()> {
        let generation = &self.generation;
        if generation.endpoint.trim().is_empty() {
            return Err(anyhow!("generation.endpoint must be non-empty"));
        }
        if generation.api_key_env.trim().is_empty() {
            return Err(anyhow!("generation.api_key_env must be non-empty"));
        }
        if generation.small_model.trim().is_empty() || generation.large_model.trim().is_empty() {
            return Err(anyhow!("generation models must be non-empty"));
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(anyhow!("generation.temperature must be within 0.0..=2.0"));
        }
        if generation.max_tokens == 0 {
            return Err(anyhow!("generation.max_tokens must be > 0"));
        }
        if generation.timeout_secs == 0 {
            return Err(anyhow!("generation.timeout_secs must be > 0"));
        }
        if self.prompts.budget_bytes == 0 {
            return Err(anyhow!("prompts.budget_bytes must be > 0"));
        }
        if self.session.default_target_minutes == 0 {
            return Err(anyhow!("session.default_target_minutes must be > 0"));
        }
        if self.session.tick_period_secs == 0 {
            return Err(anyhow!("session.tick_period_secs must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HyperfocusConfig::default()`.
pub fn load_config(path: &Path) -> Result<HyperfocusConfig> {
    if !path.exists() {
        let cfg = HyperfocusConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HyperfocusConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &HyperfocusConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, HyperfocusConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let mut cfg = HyperfocusConfig::default();
        cfg.session.tick_period_secs = 6;
        cfg.routing.energy.push("sluggish".to_string());
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("hyperfocus.toml");
        fs::write(&path, "[session]\ndefault_target_minutes = 50\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.session.default_target_minutes, 50);
        assert_eq!(cfg.session.tick_period_secs, 600);
        assert_eq!(cfg.generation, GenerationConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("hyperfocus.toml");
        fs::write(&path, "[session]\ntick_period_secs = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("tick_period_secs"));

        let mut cfg = HyperfocusConfig::default();
        cfg.generation.temperature = 3.5;
        assert!(write_config(&path, &cfg).is_err());
    }
}
