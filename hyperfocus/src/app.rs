//! The assembled service: every responder, the team and the session streamer.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::routing::RoutingTable;
use crate::io::config::HyperfocusConfig;
use crate::io::generator::Generator;
use crate::io::memory::ConversationMemory;
use crate::io::mistral::MistralGenerator;
use crate::responders::ResponderSettings;
use crate::responders::categorizer::Categorizer;
use crate::responders::coach::Coach;
use crate::responders::energy::EnergyAdvisor;
use crate::responders::guardian::Guardian;
use crate::streamer::SessionStreamer;
use crate::team::TeamCoordinator;

/// Built once at startup and shared by reference.
pub struct Hyperfocus<G> {
    categorizer: Categorizer<G>,
    energy: EnergyAdvisor<G>,
    coach: Coach<G>,
    streamer: SessionStreamer<G>,
    team: TeamCoordinator<G>,
    default_target_minutes: u32,
}

impl<G: Generator + 'static> Hyperfocus<G> {
    pub fn new(config: &HyperfocusConfig, generator: Arc<G>) -> Result<Self> {
        config.validate()?;
        let settings = ResponderSettings::from_config(config);
        let small = config.generation.small_model.as_str();
        let large = config.generation.large_model.as_str();

        let guardian = Arc::new(Guardian::new(generator.clone(), small, &settings));
        Ok(Self {
            categorizer: Categorizer::new(generator.clone(), small, &settings)
                .context("build categorizer")?,
            energy: EnergyAdvisor::new(generator.clone(), small, &settings)
                .context("build energy advisor")?,
            coach: Coach::new(generator.clone(), large, &settings),
            streamer: SessionStreamer::new(guardian, config.session.tick_period()),
            team: TeamCoordinator::new(
                generator,
                large,
                &settings,
                RoutingTable::from_keywords(&config.routing),
            ),
            default_target_minutes: config.session.default_target_minutes,
        })
    }

    pub fn categorizer(&self) -> &Categorizer<G> {
        &self.categorizer
    }

    pub fn energy_advisor(&self) -> &EnergyAdvisor<G> {
        &self.energy
    }

    pub fn coach(&self) -> &Coach<G> {
        &self.coach
    }

    pub fn streamer(&self) -> &SessionStreamer<G> {
        &self.streamer
    }

    pub fn team(&self) -> &TeamCoordinator<G> {
        &self.team
    }

    pub fn default_target_minutes(&self) -> u32 {
        self.default_target_minutes
    }
}

impl Hyperfocus<MistralGenerator> {
    /// Build against the configured Mistral endpoint, with conversation memory.
    pub fn from_config(config: &HyperfocusConfig) -> Result<Self> {
        let memory = Arc::new(ConversationMemory::new(
            config.memory.history_turns,
            config.memory.max_users,
        ));
        let generator = MistralGenerator::from_config(&config.generation)
            .context("build mistral generator")?
            .with_memory(memory);
        Self::new(config, Arc::new(generator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Role;
    use crate::test_support::ScriptedGenerator;

    #[tokio::test]
    async fn responders_use_configured_models() {
        let mut config = HyperfocusConfig::default();
        config.generation.small_model = "tiny".to_string();
        config.generation.large_model = "huge".to_string();
        let generator = Arc::new(ScriptedGenerator::new());
        let app = Hyperfocus::new(&config, generator.clone()).expect("app");

        app.categorizer().categorize("write report").await;
        app.coach().coach("ada", "help").await;
        app.team().route("ada", "Should I learn Rust?").await;

        let models: Vec<(Role, String)> = generator
            .requests()
            .into_iter()
            .map(|r| (r.role, r.model))
            .collect();
        assert_eq!(
            models,
            vec![
                (Role::Categorizer, "tiny".to_string()),
                (Role::Coach, "huge".to_string()),
                (Role::Coach, "huge".to_string()),
            ]
        );
        assert_eq!(app.default_target_minutes(), 25);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = HyperfocusConfig::default();
        config.session.tick_period_secs = 0;
        assert!(Hyperfocus::new(&config, Arc::new(ScriptedGenerator::new())).is_err());
    }
}
