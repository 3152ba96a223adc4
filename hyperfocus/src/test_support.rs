//! Test-only generators with deterministic behavior.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::core::types::Role;
use crate::io::generator::{GenerationRequest, Generator};

/// Generator that replays scripted replies per role and records every request.
///
/// A role with no scripted reply left answers with an error, which responders
/// turn into their fallback.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<HashMap<Role, VecDeque<Value>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one reply for a role.
    pub fn reply(self, role: Role, value: impl Into<Value>) -> Self {
        self.replies
            .lock()
            .expect("replies lock")
            .entry(role)
            .or_default()
            .push_back(value.into());
        self
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn roles_called(&self) -> Vec<Role> {
        self.requests().iter().map(|r| r.role).collect()
    }
}

impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .expect("replies lock")
            .get_mut(&request.role)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| anyhow!("no scripted reply for {}", request.role))
    }
}

/// Generator that always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingGenerator;

impl Generator for FailingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value> {
        Err(anyhow!("generation unavailable for {}", request.role))
    }
}
