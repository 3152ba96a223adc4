//! Team delegation: route a question to one responder or gather the whole team.

use std::sync::Arc;

use tracing::info;

use crate::core::contract::ResponseContract;
use crate::core::routing::{RouteTarget, RoutingTable};
use crate::core::types::Role;
use crate::io::generator::Generator;
use crate::io::prompt::PromptBuilder;
use crate::responders::{Responder, ResponderSettings, TEAM_INSTRUCTIONS, instructions_for};

pub const TEAM_FALLBACK: &str = "Focus on your most purposeful task right now.";

/// Part of the question each member answers.
fn member_focus(role: Role) -> &'static str {
    match role {
        Role::Coach => "Give the overall strategy and personalized advice.",
        Role::EnergyAdvisor => {
            "Focus on energy patterns and the best time of day for each kind of work."
        }
        Role::Guardian => "Focus on session support and handling distractions.",
        Role::Categorizer => "Focus on which quadrant the work belongs to.",
    }
}

pub struct TeamCoordinator<G> {
    routing: RoutingTable,
    coach: Responder<G>,
    energy: Responder<G>,
    guardian: Responder<G>,
    prompts: PromptBuilder,
    contract: ResponseContract<String>,
}

impl<G: Generator> TeamCoordinator<G> {
    pub fn new(
        generator: Arc<G>,
        model: &str,
        settings: &ResponderSettings,
        routing: RoutingTable,
    ) -> Self {
        let member = |role: Role| {
            Responder::new(role, model, generator.clone(), settings.timeout)
                .with_instructions(format!("{TEAM_INSTRUCTIONS}\n{}", instructions_for(role)))
        };
        Self {
            routing,
            coach: member(Role::Coach),
            energy: member(Role::EnergyAdvisor),
            guardian: member(Role::Guardian),
            prompts: PromptBuilder::new(settings.prompt_budget_bytes),
            contract: ResponseContract::text("team_answer", TEAM_FALLBACK),
        }
    }

    /// Answer a question with the responder (or responders) its topic calls for.
    ///
    /// Never empty: a failed member contributes the team fallback. Multi answers
    /// are joined in Coach, Energy, Guardian order with a blank line, and an
    /// answer identical to an earlier one is dropped, so three fallbacks
    /// collapse into one.
    pub async fn route(&self, user_id: &str, question: &str) -> String {
        let rule = self.routing.route(question);
        info!(rule = %rule.name, target = rule.target.as_str(), "routing team question");
        match rule.target {
            RouteTarget::Coach => self.ask(&self.coach, user_id, question).await,
            RouteTarget::EnergyAdvisor => self.ask(&self.energy, user_id, question).await,
            RouteTarget::Guardian => self.ask(&self.guardian, user_id, question).await,
            RouteTarget::Multi => {
                let (coach, energy, guardian) = tokio::join!(
                    self.ask(&self.coach, user_id, question),
                    self.ask(&self.energy, user_id, question),
                    self.ask(&self.guardian, user_id, question),
                );
                merge_answers([coach, energy, guardian])
            }
        }
    }

    async fn ask(&self, member: &Responder<G>, user_id: &str, question: &str) -> String {
        let role = member.role();
        let prompt =
            self.prompts
                .build_team_member(role.display_name(), member_focus(role), question);
        member.invoke(&prompt, &self.contract, Some(user_id)).await
    }
}

/// Join answers in order, blank-line separated, skipping repeats.
fn merge_answers(answers: impl IntoIterator<Item = String>) -> String {
    let mut merged: Vec<String> = Vec::new();
    for answer in answers {
        if !merged.contains(&answer) {
            merged.push(answer);
        }
    }
    merged.join("\n\n")
}
