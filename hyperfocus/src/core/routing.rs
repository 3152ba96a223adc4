//! Static delegation policy for team questions.
//!
//! Rules are evaluated in declared order and the first match wins. Every
//! table ends with a catch-all rule for the coach, so routing is total.

use serde::{Deserialize, Serialize};

/// Responder (or responder group) that handles a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    Coach,
    EnergyAdvisor,
    Guardian,
    /// Coach, energy advisor and guardian together, answers joined in that order.
    Multi,
}

impl RouteTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteTarget::Coach => "coach",
            RouteTarget::EnergyAdvisor => "energy_advisor",
            RouteTarget::Guardian => "guardian",
            RouteTarget::Multi => "multi",
        }
    }
}

/// Keyword-based topic test over a question.
///
/// Keywords match at word starts, so `distract` matches "distracted" but
/// `rest` does not match "interesting". Multi-word keywords match as phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicPredicate {
    AnyKeyword(Vec<String>),
    AllOf(Vec<TopicPredicate>),
    AnyOf(Vec<TopicPredicate>),
    Always,
}

impl TopicPredicate {
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized = keywords
            .into_iter()
            .map(|k| normalize(k.as_ref()))
            .filter(|k| !k.trim().is_empty())
            .map(|k| k.trim_end().to_string())
            .collect();
        TopicPredicate::AnyKeyword(normalized)
    }

    pub fn matches(&self, question: &str) -> bool {
        self.matches_normalized(&normalize(question))
    }

    fn matches_normalized(&self, question: &str) -> bool {
        match self {
            TopicPredicate::AnyKeyword(keywords) => {
                keywords.iter().any(|keyword| question.contains(keyword.as_str()))
            }
            TopicPredicate::AllOf(parts) => parts.iter().all(|p| p.matches_normalized(question)),
            TopicPredicate::AnyOf(parts) => parts.iter().any(|p| p.matches_normalized(question)),
            TopicPredicate::Always => true,
        }
    }
}

/// Lowercase, keep word characters, and pad with spaces: `" plan my day "`.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    for word in text
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
    {
        out.push_str(&word.to_lowercase());
        out.push(' ');
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    pub name: String,
    pub predicate: TopicPredicate,
    pub target: RouteTarget,
}

impl RoutingRule {
    pub fn new(name: impl Into<String>, predicate: TopicPredicate, target: RouteTarget) -> Self {
        Self {
            name: name.into(),
            predicate,
            target,
        }
    }
}

/// Keyword lists behind the standard routing table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RoutingKeywords {
    /// Topics that call for the whole team.
    pub holistic: Vec<String>,
    pub energy: Vec<String>,
    pub guardian: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RoutingKeywords {
    fn default() -> Self {
        Self {
            holistic: strings(&[
                "holistic",
                "overall",
                "big picture",
                "plan my day",
                "whole day",
                "my week",
                "routine",
                "everything",
            ]),
            energy: strings(&[
                "energy",
                "tired",
                "exhausted",
                "sleepy",
                "fatigue",
                "burnout",
                "burned out",
                "slump",
                "schedule",
                "when should",
                "time of day",
                "morning",
                "afternoon",
                "evening",
                "circadian",
                "rhythm",
            ]),
            guardian: strings(&[
                "session",
                "distract",
                "focus",
                "hyperfocus",
                "scatterfocus",
                "concentrat",
                "stay on track",
                "procrastinat",
                "interrupt",
                "mind wander",
                "encourag",
                "motivat",
            ]),
        }
    }
}

/// Ordered, immutable rule list with a guaranteed catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    rules: Vec<RoutingRule>,
}

impl RoutingTable {
    /// Build a table from explicit rules; a default coach rule is appended.
    pub fn new(mut rules: Vec<RoutingRule>) -> Self {
        rules.push(RoutingRule::new(
            "default",
            TopicPredicate::Always,
            RouteTarget::Coach,
        ));
        Self { rules }
    }

    /// Standard table: holistic or mixed topics, then energy, then guardian.
    pub fn from_keywords(keywords: &RoutingKeywords) -> Self {
        let energy = TopicPredicate::keywords(&keywords.energy);
        let guardian = TopicPredicate::keywords(&keywords.guardian);
        let multi = TopicPredicate::AnyOf(vec![
            TopicPredicate::keywords(&keywords.holistic),
            TopicPredicate::AllOf(vec![energy.clone(), guardian.clone()]),
        ]);
        Self::new(vec![
            RoutingRule::new("holistic", multi, RouteTarget::Multi),
            RoutingRule::new("energy", energy, RouteTarget::EnergyAdvisor),
            RoutingRule::new("guardian", guardian, RouteTarget::Guardian),
        ])
    }

    /// First rule whose predicate matches the question.
    pub fn route(&self, question: &str) -> &RoutingRule {
        let normalized = normalize(question);
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches_normalized(&normalized))
            .unwrap_or_else(|| unreachable!("routing table always ends with a catch-all rule"))
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::from_keywords(&RoutingKeywords::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(question: &str) -> RouteTarget {
        RoutingTable::default().route(question).target
    }

    #[test]
    fn energy_questions_go_to_energy_advisor() {
        assert_eq!(
            target("I'm always tired after lunch, what should I do?"),
            RouteTarget::EnergyAdvisor
        );
        assert_eq!(
            target("When should I schedule deep work?"),
            RouteTarget::EnergyAdvisor
        );
    }

    #[test]
    fn session_questions_go_to_guardian() {
        assert_eq!(
            target("I keep getting distracted by Slack"),
            RouteTarget::Guardian
        );
        assert_eq!(
            target("How do I stay on track during a long session?"),
            RouteTarget::Guardian
        );
    }

    #[test]
    fn mixed_or_holistic_questions_go_to_the_team() {
        assert_eq!(
            target("I'm exhausted and can't concentrate"),
            RouteTarget::Multi
        );
        assert_eq!(
            target("Can you help me plan my day?"),
            RouteTarget::Multi
        );
    }

    #[test]
    fn unmatched_questions_fall_back_to_coach() {
        let table = RoutingTable::default();
        let rule = table.route("Should I learn Rust or Go?");
        assert_eq!(rule.target, RouteTarget::Coach);
        assert_eq!(rule.name, "default");
        assert_eq!(table.route("").target, RouteTarget::Coach);
    }

    #[test]
    fn keywords_match_at_word_starts_only() {
        let predicate = TopicPredicate::keywords(["rest", "time of day"]);
        assert!(predicate.matches("I need REST"));
        assert!(predicate.matches("best time-of-day for writing?"));
        assert!(!predicate.matches("that is interesting"));
    }

    #[test]
    fn declared_order_wins() {
        let table = RoutingTable::new(vec![
            RoutingRule::new(
                "first",
                TopicPredicate::keywords(["report"]),
                RouteTarget::Guardian,
            ),
            RoutingRule::new(
                "second",
                TopicPredicate::keywords(["report"]),
                RouteTarget::EnergyAdvisor,
            ),
        ]);
        assert_eq!(table.route("write the report").name, "first");
        assert_eq!(table.rules().last().expect("rule").target, RouteTarget::Coach);
    }

    #[test]
    fn empty_keyword_list_never_matches() {
        let table = RoutingTable::from_keywords(&RoutingKeywords {
            holistic: Vec::new(),
            energy: Vec::new(),
            guardian: vec!["  ".to_string()],
        });
        assert_eq!(table.route("tired and distracted").target, RouteTarget::Coach);
    }
}
