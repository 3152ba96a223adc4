//! Focus-session state machine.
//!
//! `Pending -> Running -> {Completed, EndedEarly}`. The clock is driven
//! externally: the caller decides when a tick boundary has been reached and the
//! clock only enforces transitions and produces checkpoint events. One clock
//! per session; nothing is shared between clocks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::FocusMode;

/// Session time between two periodic check-ins.
pub const CHECK_INTERVAL_MINUTES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    Running,
    Completed,
    EndedEarly,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::EndedEarly)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Pending => "pending",
            SessionState::Running => "running",
            SessionState::Completed => "completed",
            SessionState::EndedEarly => "ended early",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a checkpoint marks in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckpointKind {
    Start,
    MidCheck,
    Distraction,
    End {
        completed: bool,
        duration_minutes: u32,
    },
}

impl CheckpointKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckpointKind::Start => "start",
            CheckpointKind::MidCheck => "mid_check",
            CheckpointKind::Distraction => "distraction",
            CheckpointKind::End { .. } => "end",
        }
    }
}

/// Immutable event emitted by [`SessionClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(flatten)]
    pub kind: CheckpointKind,
    pub minutes_elapsed: u32,
    pub minutes_remaining: u32,
    pub distraction_count: u32,
}

impl Checkpoint {
    pub fn is_end(&self) -> bool {
        matches!(self.kind, CheckpointKind::End { .. })
    }
}

/// Precondition violations reported by the clock.
///
/// A failed call leaves the clock exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("target minutes must be greater than zero")]
    InvalidTarget,
    #[error("cannot {action} a session that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
}

/// Lifecycle of a single focus session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    mode: FocusMode,
    target_minutes: u32,
    elapsed_minutes: u32,
    distraction_count: u32,
    state: SessionState,
}

impl SessionClock {
    pub fn new(mode: FocusMode, target_minutes: u32) -> Result<Self, SessionError> {
        if target_minutes == 0 {
            return Err(SessionError::InvalidTarget);
        }
        Ok(Self {
            mode,
            target_minutes,
            elapsed_minutes: 0,
            distraction_count: 0,
            state: SessionState::Pending,
        })
    }

    pub fn mode(&self) -> FocusMode {
        self.mode
    }

    pub fn target_minutes(&self) -> u32 {
        self.target_minutes
    }

    pub fn elapsed_minutes(&self) -> u32 {
        self.elapsed_minutes
    }

    pub fn remaining_minutes(&self) -> u32 {
        self.target_minutes - self.elapsed_minutes
    }

    pub fn distraction_count(&self) -> u32 {
        self.distraction_count
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session minutes until the next tick boundary.
    ///
    /// The last boundary falls on the target itself, so a 25 minute session
    /// ticks at 10, 20 and 25.
    pub fn minutes_until_tick(&self) -> u32 {
        self.remaining_minutes().min(CHECK_INTERVAL_MINUTES)
    }

    pub fn start(&mut self) -> Result<Checkpoint, SessionError> {
        if self.state != SessionState::Pending {
            return Err(self.invalid("start"));
        }
        self.state = SessionState::Running;
        Ok(self.checkpoint(CheckpointKind::Start))
    }

    /// Advance one check interval, or complete the session if the next
    /// check-in would reach the target.
    pub fn tick(&mut self) -> Result<Checkpoint, SessionError> {
        self.require_running("tick")?;
        let next = self.elapsed_minutes + CHECK_INTERVAL_MINUTES;
        if next < self.target_minutes {
            self.elapsed_minutes = next;
            return Ok(self.checkpoint(CheckpointKind::MidCheck));
        }
        self.elapsed_minutes = self.target_minutes;
        self.state = SessionState::Completed;
        Ok(self.checkpoint(CheckpointKind::End {
            completed: true,
            duration_minutes: self.target_minutes,
        }))
    }

    pub fn log_distraction(&mut self) -> Result<Checkpoint, SessionError> {
        self.require_running("log a distraction in")?;
        self.distraction_count += 1;
        Ok(self.checkpoint(CheckpointKind::Distraction))
    }

    pub fn stop(&mut self) -> Result<Checkpoint, SessionError> {
        self.require_running("stop")?;
        self.state = SessionState::EndedEarly;
        Ok(self.checkpoint(CheckpointKind::End {
            completed: false,
            duration_minutes: self.elapsed_minutes,
        }))
    }

    fn require_running(&self, action: &'static str) -> Result<(), SessionError> {
        if self.state == SessionState::Running {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state,
        }
    }

    fn checkpoint(&self, kind: CheckpointKind) -> Checkpoint {
        Checkpoint {
            kind,
            minutes_elapsed: self.elapsed_minutes,
            minutes_remaining: self.remaining_minutes(),
            distraction_count: self.distraction_count,
        }
    }
}
