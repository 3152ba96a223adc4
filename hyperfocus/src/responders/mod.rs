//! Role-bound responders around the generation collaborator.
//!
//! Every responder call goes prompt -> generate -> contract. Calls never fail:
//! errors, timeouts and non-conforming output all resolve to the contract's
//! fallback.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::core::contract::{GenerationResult, ResponseContract};
use crate::core::types::Role;
use crate::io::config::HyperfocusConfig;
use crate::io::generator::{GenerationRequest, Generator};
use crate::io::prompt::PromptPack;

pub mod categorizer;
pub mod coach;
pub mod energy;
pub mod guardian;

const CATEGORIZER_INSTRUCTIONS: &str = include_str!("instructions/categorizer.md");
const ENERGY_ADVISOR_INSTRUCTIONS: &str = include_str!("instructions/energy_advisor.md");
const COACH_INSTRUCTIONS: &str = include_str!("instructions/coach.md");
const GUARDIAN_INSTRUCTIONS: &str = include_str!("instructions/guardian.md");
pub(crate) const TEAM_INSTRUCTIONS: &str = include_str!("instructions/team.md");

/// System instructions for a role.
pub fn instructions_for(role: Role) -> &'static str {
    match role {
        Role::Categorizer => CATEGORIZER_INSTRUCTIONS,
        Role::EnergyAdvisor => ENERGY_ADVISOR_INSTRUCTIONS,
        Role::Coach => COACH_INSTRUCTIONS,
        Role::Guardian => GUARDIAN_INSTRUCTIONS,
    }
}

/// Settings shared by every responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderSettings {
    pub timeout: Duration,
    pub prompt_budget_bytes: usize,
}

impl ResponderSettings {
    pub fn from_config(config: &HyperfocusConfig) -> Self {
        Self {
            timeout: config.generation.timeout(),
            prompt_budget_bytes: config.prompts.budget_bytes,
        }
    }
}

/// A role tag, its instructions and model, bound to a shared generator.
pub struct Responder<G> {
    role: Role,
    model: String,
    instructions: String,
    generator: Arc<G>,
    timeout: Duration,
}

impl<G> std::fmt::Debug for Responder<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("role", &self.role)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<G: Generator> Responder<G> {
    pub fn new(role: Role, model: impl Into<String>, generator: Arc<G>, timeout: Duration) -> Self {
        Self {
            role,
            model: model.into(),
            instructions: instructions_for(role).to_string(),
            generator,
            timeout,
        }
    }

    /// Replace the role's default system instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Generate a response for `prompt` and resolve it through `contract`.
    pub async fn invoke<T>(
        &self,
        prompt: &PromptPack,
        contract: &ResponseContract<T>,
        user_id: Option<&str>,
    ) -> T
    where
        T: DeserializeOwned + Clone,
    {
        let request = GenerationRequest {
            role: self.role,
            model: self.model.clone(),
            instructions: self.instructions.clone(),
            prompt: prompt.render(),
            schema: contract.schema().cloned(),
            user_id: user_id.map(str::to_string),
        };
        debug!(role = %self.role, contract = contract.name(), "invoking responder");

        let result =
            match tokio::time::timeout(self.timeout, self.generator.generate(&request)).await {
                Ok(Ok(raw)) => GenerationResult::success(raw),
                Ok(Err(err)) => {
                    warn!(role = %self.role, error = %err, "generation failed; using fallback");
                    GenerationResult::failure()
                }
                Err(_) => {
                    warn!(
                        role = %self.role,
                        timeout_secs = self.timeout.as_secs(),
                        "generation timed out; using fallback"
                    );
                    GenerationResult::failure()
                }
            };
        contract.resolve(result)
    }
}
