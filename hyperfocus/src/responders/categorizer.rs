//! Task categorizer: sorts a task into one of the four quadrants.

use std::sync::Arc;

use anyhow::Result;

use crate::core::contract::ResponseContract;
use crate::core::types::{EnergyLevel, Role, TaskCategorization, TaskType, TimeOfDay};
use crate::io::generator::Generator;
use crate::io::prompt::PromptBuilder;

use super::{Responder, ResponderSettings};

const CATEGORIZATION_SCHEMA: &str = include_str!("../../schemas/task_categorization.schema.json");

/// Categorization returned when generation fails or does not conform.
pub fn fallback_categorization() -> TaskCategorization {
    TaskCategorization {
        category: TaskType::Purposeful,
        reasoning: "Default categorization - please review".to_string(),
        suggested_time_of_day: TimeOfDay::Morning,
        estimated_energy_required: EnergyLevel::High,
    }
}

#[derive(Debug)]
pub struct Categorizer<G> {
    responder: Responder<G>,
    prompts: PromptBuilder,
    contract: ResponseContract<TaskCategorization>,
}

impl<G: Generator> Categorizer<G> {
    pub fn new(generator: Arc<G>, model: &str, settings: &ResponderSettings) -> Result<Self> {
        Ok(Self {
            responder: Responder::new(Role::Categorizer, model, generator, settings.timeout),
            prompts: PromptBuilder::new(settings.prompt_budget_bytes),
            contract: ResponseContract::structured(
                "task_categorization",
                CATEGORIZATION_SCHEMA,
                fallback_categorization(),
            )?,
        })
    }

    pub async fn categorize(&self, task_title: &str) -> TaskCategorization {
        let prompt = self.prompts.build_categorizer(task_title);
        self.responder.invoke(&prompt, &self.contract, None).await
    }
}
