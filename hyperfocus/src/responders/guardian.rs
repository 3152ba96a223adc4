//! Focus guardian: one short message per session checkpoint.

use std::sync::Arc;

use crate::core::contract::ResponseContract;
use crate::core::session::{Checkpoint, CheckpointKind};
use crate::core::types::{FocusMode, Role};
use crate::io::generator::Generator;
use crate::io::prompt::PromptBuilder;

use super::{Responder, ResponderSettings};

/// Message used when generation fails for a checkpoint.
pub fn fallback_message(checkpoint: &Checkpoint) -> String {
    match checkpoint.kind {
        CheckpointKind::Start => "Let's begin. You've got this! 💪".to_string(),
        CheckpointKind::MidCheck => format!(
            "{} minutes remaining. Keep going!",
            checkpoint.minutes_remaining
        ),
        CheckpointKind::Distraction => {
            "No worries! Take a breath and gently return to your task. 🌿".to_string()
        }
        CheckpointKind::End { .. } => "Great session! Every minute of focus counts. 🎉".to_string(),
    }
}

#[derive(Debug)]
pub struct Guardian<G> {
    responder: Responder<G>,
    prompts: PromptBuilder,
    contract: ResponseContract<String>,
}

impl<G: Generator> Guardian<G> {
    pub fn new(generator: Arc<G>, model: &str, settings: &ResponderSettings) -> Self {
        Self {
            responder: Responder::new(Role::Guardian, model, generator, settings.timeout),
            prompts: PromptBuilder::new(settings.prompt_budget_bytes),
            contract: ResponseContract::text("guardian_message", ""),
        }
    }

    pub async fn message_for(
        &self,
        mode: FocusMode,
        task_title: Option<&str>,
        checkpoint: &Checkpoint,
    ) -> String {
        let prompt = self.prompts.build_guardian(mode, task_title, checkpoint);
        let contract = self.contract.with_fallback(fallback_message(checkpoint));
        self.responder.invoke(&prompt, &contract, None).await
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

    fn checkpoint(kind: CheckpointKind, remaining: u32) -> Checkpoint {
        Checkpoint {
            kind,
            minutes_elapsed: 25 - remaining,
            minutes_remaining: remaining,
            distraction_count: 0,
        }
    }

    #[tokio::test]
    async fn fallbacks_follow_checkpoint_kind() {
        let guardian = Guardian::new(Arc::new(FailingGenerator), "small", &settings());
        let mode = FocusMode::Hyperfocus;

        assert_eq!(
            guardian
                .message_for(mode, None, &checkpoint(CheckpointKind::Start, 25))
                .await,
            "Let's begin. You've got this! 💪"
        );
        assert_eq!(
            guardian
                .message_for(mode, None, &checkpoint(CheckpointKind::MidCheck, 15))
                .await,
            "15 minutes remaining. Keep going!"
        );
        assert!(
            guardian
                .message_for(mode, None, &checkpoint(CheckpointKind::Distraction, 15))
                .await
                .starts_with("No worries!")
        );
        let end = CheckpointKind::End {
            completed: true,
            duration_minutes: 25,
        };
        assert!(
            guardian
                .message_for(mode, None, &checkpoint(end, 0))
                .await
                .starts_with("Great session!")
        );
    }

    #[tokio::test]
    async fn generated_message_is_used_when_present() {
        let generator =
            Arc::new(ScriptedGenerator::new().reply(Role::Guardian, "Breathe and begin."));
        let guardian = Guardian::new(generator.clone(), "small", &settings());

        let got = guardian
            .message_for(
                FocusMode::Scatterfocus,
                Some("brainstorm names"),
                &checkpoint(CheckpointKind::Start, 25),
            )
            .await;

        assert_eq!(got, "Breathe and begin.");
        let request = generator.requests().pop().expect("request");
        assert!(request.prompt.contains("scatterfocus"));
        assert!(request.prompt.contains("brainstorm names"));
    }
}
