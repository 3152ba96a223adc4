//! Productivity coach: free-text advice with per-user conversation memory.

use std::sync::Arc;

use crate::core::contract::ResponseContract;
use crate::core::types::Role;
use crate::io::generator::Generator;
use crate::io::prompt::PromptBuilder;

use super::{Responder, ResponderSettings};

pub const COACHING_FALLBACK: &str = "Stay focused on your purposeful work!";

#[derive(Debug)]
pub struct Coach<G> {
    responder: Responder<G>,
    prompts: PromptBuilder,
    contract: ResponseContract<String>,
}

impl<G: Generator> Coach<G> {
    pub fn new(generator: Arc<G>, model: &str, settings: &ResponderSettings) -> Self {
        Self {
            responder: Responder::new(Role::Coach, model, generator, settings.timeout),
            prompts: PromptBuilder::new(settings.prompt_budget_bytes),
            contract: ResponseContract::text("coaching", COACHING_FALLBACK),
        }
    }

    pub async fn coach(&self, user_id: &str, context: &str) -> String {
        let prompt = self.prompts.build_coach(context);
        self.responder
            .invoke(&prompt, &self.contract, Some(user_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingGenerator, ScriptedGenerator};
    use std::time::Duration;

    fn settings() -> ResponderSettings {
        ResponderSettings {
            timeout: Duration::from_secs(5),
            prompt_budget_bytes: 4_000,
        }
    }

    #[tokio::test]
    async fn coaching_is_keyed_by_user() {
        let generator = Arc::new(
            ScriptedGenerator::new().reply(Role::Coach, "Block your mornings for deep work."),
        );
        let coach = Coach::new(generator.clone(), "large", &settings());

        let advice = coach.coach("ada", "Meetings eat my mornings").await;

        assert_eq!(advice, "Block your mornings for deep work.");
        let request = generator.requests().pop().expect("request");
        assert_eq!(request.user_id.as_deref(), Some("ada"));
        assert_eq!(request.model, "large");
    }

    #[tokio::test]
    async fn failing_generator_returns_fallback() {
        let coach = Coach::new(Arc::new(FailingGenerator), "large", &settings());
        assert_eq!(coach.coach("ada", "help").await, COACHING_FALLBACK);
    }
}
