//! Prompt builder for responder requests.

use std::sync::LazyLock;

use minijinja::{Environment, context};
use tracing::debug;

use crate::core::session::{Checkpoint, CheckpointKind};
use crate::core::types::FocusMode;

const CATEGORIZER_TEMPLATE: &str = include_str!("prompts/categorizer.md");
const ENERGY_TEMPLATE: &str = include_str!("prompts/energy_advisor.md");
const COACH_TEMPLATE: &str = include_str!("prompts/coach.md");
const GUARDIAN_START_TEMPLATE: &str = include_str!("prompts/guardian_start.md");
const GUARDIAN_CHECK_TEMPLATE: &str = include_str!("prompts/guardian_check.md");
const GUARDIAN_DISTRACTION_TEMPLATE: &str = include_str!("prompts/guardian_distraction.md");
const GUARDIAN_END_TEMPLATE: &str = include_str!("prompts/guardian_end.md");
const TEAM_TEMPLATE: &str = include_str!("prompts/team.md");

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        for (name, source) in [
            ("categorizer", CATEGORIZER_TEMPLATE),
            ("energy_advisor", ENERGY_TEMPLATE),
            ("coach", COACH_TEMPLATE),
            ("guardian_start", GUARDIAN_START_TEMPLATE),
            ("guardian_check", GUARDIAN_CHECK_TEMPLATE),
            ("guardian_distraction", GUARDIAN_DISTRACTION_TEMPLATE),
            ("guardian_end", GUARDIAN_END_TEMPLATE),
            ("team", TEAM_TEMPLATE),
        ] {
            env.add_template(name, source)
                .unwrap_or_else(|err| panic!("{name} template should be valid: {err}"));
        }
        Self { env }
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> String {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .unwrap_or_else(|err| panic!("{name} template rendering should not fail: {err}"))
    }
}

static ENGINE: LazyLock<PromptEngine> = LazyLock::new(PromptEngine::new);

/// A parsed section from rendered template output.
#[derive(Debug, Clone)]
struct ParsedSection {
    /// Section identifier (e.g., "task", "activities").
    key: String,
    /// Whether this section is required (cannot be dropped).
    required: bool,
    /// Section content without its marker.
    content: String,
}

/// Parse sections from rendered template output using HTML comment markers.
///
/// Markers follow format: `<!-- section:KEY required|droppable -->`
fn parse_sections(rendered: &str) -> Vec<ParsedSection> {
    static SECTION_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"<!--\s*section:(\w+)\s+(required|droppable)\s*-->")
            .expect("section marker regex should compile")
    });

    let markers: Vec<(usize, usize, String, bool)> = SECTION_RE
        .captures_iter(rendered)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = caps.get(1)?.as_str().to_string();
            let required = caps.get(2)?.as_str() == "required";
            Some((whole.start(), whole.end(), key, required))
        })
        .collect();

    let mut sections = Vec::new();
    for (i, (_, start, key, required)) in markers.iter().enumerate() {
        let end = markers
            .get(i + 1)
            .map(|(next_start, ..)| *next_start)
            .unwrap_or(rendered.len());
        let content = rendered[*start..end].trim().to_string();
        if !content.is_empty() || *required {
            sections.push(ParsedSection {
                key: key.clone(),
                required: *required,
                content,
            });
        }
    }
    sections
}

/// Apply budget to parsed sections, dropping droppable sections as needed.
///
/// Drop order: activities -> distractions. The last section is truncated if
/// required sections alone exceed the budget.
fn apply_budget_to_sections(sections: &mut Vec<ParsedSection>, budget: usize) {
    let total_len =
        |secs: &[ParsedSection]| -> usize { secs.iter().map(|s| s.content.len()).sum() };

    if total_len(sections) <= budget {
        return;
    }

    for key in ["activities", "distractions"] {
        if total_len(sections) <= budget {
            break;
        }
        if let Some(idx) = sections.iter().position(|s| s.key == key && !s.required) {
            let dropped_len = sections[idx].content.len();
            debug!(
                section = key,
                bytes_dropped = dropped_len,
                "dropped section for budget"
            );
            sections.remove(idx);
        }
    }

    if total_len(sections) <= budget {
        return;
    }
    let other_len: usize = sections
        .iter()
        .take(sections.len().saturating_sub(1))
        .map(|s| s.content.len())
        .sum();
    let allowed = budget.saturating_sub(other_len);
    if let Some(last) = sections.last_mut() {
        let before_len = last.content.len();
        if before_len > allowed {
            let marker = "\n[truncated]";
            let keep = if allowed > marker.len() {
                allowed - marker.len()
            } else {
                allowed
            };
            last.content.truncate(floor_char_boundary(&last.content, keep));
            if allowed > marker.len() {
                last.content.push_str(marker);
            }
            debug!(
                section = last.key,
                before_len,
                after_len = last.content.len(),
                "truncated section for budget"
            );
        }
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Render sections back to a single string.
fn render_sections(sections: &[ParsedSection]) -> String {
    sections
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|s| !s.is_empty())
}

/// Builds role prompts within a byte budget, dropping less critical sections first.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    budget_bytes: usize,
}

impl PromptBuilder {
    /// Create a builder with the given byte budget.
    pub fn new(budget_bytes: usize) -> Self {
        Self { budget_bytes }
    }

    pub fn build_categorizer(&self, task_title: &str) -> PromptPack {
        self.build(
            "categorizer",
            context! { task_title => task_title.trim() },
        )
    }

    pub fn build_energy_advisor(
        &self,
        current_energy: &str,
        hour_of_day: u8,
        recent_activities: Option<&str>,
    ) -> PromptPack {
        self.build(
            "energy_advisor",
            context! {
                current_energy => current_energy.trim(),
                hour_of_day => hour_of_day,
                recent_activities => non_blank(recent_activities),
            },
        )
    }

    pub fn build_coach(&self, context: &str) -> PromptPack {
        self.build("coach", context! { context => context.trim() })
    }

    /// Guardian prompt for one session checkpoint.
    pub fn build_guardian(
        &self,
        mode: FocusMode,
        task_title: Option<&str>,
        checkpoint: &Checkpoint,
    ) -> PromptPack {
        let mode = mode.as_str();
        match checkpoint.kind {
            CheckpointKind::Start => self.build(
                "guardian_start",
                context! { mode => mode, task_title => non_blank(task_title) },
            ),
            CheckpointKind::MidCheck => self.build(
                "guardian_check",
                context! {
                    mode => mode,
                    elapsed => checkpoint.minutes_elapsed,
                    remaining => checkpoint.minutes_remaining,
                    distraction_count => checkpoint.distraction_count,
                },
            ),
            CheckpointKind::Distraction => self.build(
                "guardian_distraction",
                context! { mode => mode, distraction_count => checkpoint.distraction_count },
            ),
            CheckpointKind::End {
                completed,
                duration_minutes,
            } => self.build(
                "guardian_end",
                context! {
                    mode => mode,
                    completed => completed,
                    duration => duration_minutes,
                    distraction_count => checkpoint.distraction_count,
                },
            ),
        }
    }

    /// Team-member prompt: the shared question plus the member's part.
    pub fn build_team_member(&self, member: &str, focus: &str, question: &str) -> PromptPack {
        self.build(
            "team",
            context! { member => member, focus => focus, question => question.trim() },
        )
    }

    fn build(&self, template: &str, ctx: minijinja::Value) -> PromptPack {
        let rendered = ENGINE.render(template, ctx);
        let mut sections = parse_sections(&rendered);
        apply_budget_to_sections(&mut sections, self.budget_bytes);
        PromptPack {
            content: render_sections(&sections),
        }
    }
}

/// A rendered prompt ready to send to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPack {
    content: String,
}

impl PromptPack {
    /// Get the rendered prompt content.
    pub fn render(&self) -> String {
        self.content.clone()
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}
