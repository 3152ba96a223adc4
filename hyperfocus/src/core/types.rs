//! Shared domain types for hyperfocus core logic.
//!
//! These types define the stable shapes exchanged between responders, the
//! session clock and callers. Serialized names are part of the contract with
//! the generation collaborator and must remain stable.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Task category based on the four quadrants of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Purposeful,
    Necessary,
    Distracting,
    Unnecessary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Moderate,
    High,
    Peak,
}

/// Structured categorization produced by the categorizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCategorization {
    pub category: TaskType,
    pub reasoning: String,
    pub suggested_time_of_day: TimeOfDay,
    pub estimated_energy_required: EnergyLevel,
}

/// Kind of work recommended for the current energy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimalTaskType {
    Purposeful,
    Necessary,
    Creative,
    Rest,
}

/// Structured energy advice produced by the energy advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyAdvice {
    pub current_recommendation: String,
    pub optimal_task_type: OptimalTaskType,
    pub reasoning: String,
    /// When energy is expected to change, if the model could tell.
    #[serde(default)]
    pub next_energy_shift: Option<String>,
}

/// Focus session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusMode {
    Hyperfocus,
    Scatterfocus,
}

impl FocusMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FocusMode::Hyperfocus => "hyperfocus",
            FocusMode::Scatterfocus => "scatterfocus",
        }
    }
}

impl fmt::Display for FocusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FocusMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hyperfocus" => Ok(FocusMode::Hyperfocus),
            "scatterfocus" => Ok(FocusMode::Scatterfocus),
            other => Err(anyhow!(
                "unknown focus mode {other:?} (expected hyperfocus or scatterfocus)"
            )),
        }
    }
}

/// Responder role tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Categorizer,
    EnergyAdvisor,
    Coach,
    Guardian,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Categorizer => "categorizer",
            Role::EnergyAdvisor => "energy_advisor",
            Role::Coach => "coach",
            Role::Guardian => "guardian",
        }
    }

    /// Display name used in logs and generation requests.
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Categorizer => "TaskCategorizer",
            Role::EnergyAdvisor => "EnergyAdvisor",
            Role::Coach => "HyperfocusCoach",
            Role::Guardian => "FocusGuardian",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
