//! Energy advisor: matches work to the user's current energy and time of day.

use std::sync::Arc;

use anyhow::Result;

use crate::core::contract::ResponseContract;
use crate::core::types::{EnergyAdvice, OptimalTaskType, Role};
use crate::io::generator::Generator;
use crate::io::prompt::PromptBuilder;

use super::{Responder, ResponderSettings};

const ENERGY_ADVICE_SCHEMA: &str = include_str!("../../schemas/energy_advice.schema.json");

pub fn fallback_energy_advice() -> EnergyAdvice {
    EnergyAdvice {
        current_recommendation: "Take a short break to recharge".to_string(),
        optimal_task_type: OptimalTaskType::Rest,
        reasoning: "Unable to analyze current state".to_string(),
        next_energy_shift: None,
    }
}

#[derive(Debug)]
pub struct EnergyAdvisor<G> {
    responder: Responder<G>,
    prompts: PromptBuilder,
    contract: ResponseContract<EnergyAdvice>,
}

impl<G: Generator> EnergyAdvisor<G> {
    pub fn new(generator: Arc<G>, model: &str, settings: &ResponderSettings) -> Result<Self> {
        Ok(Self {
            responder: Responder::new(Role::EnergyAdvisor, model, generator, settings.timeout),
            prompts: PromptBuilder::new(settings.prompt_budget_bytes),
            contract: ResponseContract::structured(
                "energy_advice",
                ENERGY_ADVICE_SCHEMA,
                fallback_energy_advice(),
            )?,
        })
    }

    /// Advice for the given energy level at `hour_of_day` (0-23).
    pub async fn advise(
        &self,
        current_energy: &str,
        hour_of_day: u8,
        recent_activities: Option<&str>,
    ) -> EnergyAdvice {
        let prompt =
            self.prompts
                .build_energy_advisor(current_energy, hour_of_day, recent_activities);
        self.responder.invoke(&prompt, &self.contract, None).await
    }
}
