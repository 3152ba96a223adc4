//! Generation abstraction for responder invocation.
//!
//! The [`Generator`] trait decouples responders from the actual model backend
//! (currently the Mistral chat completions API). Tests use scripted generators
//! that return predetermined outputs without touching the network.

use std::future::Future;

use anyhow::Result;
use serde_json::Value;

use crate::core::types::Role;

/// Parameters for a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Responder role issuing the call.
    pub role: Role,
    /// Model identifier passed through to the backend.
    pub model: String,
    /// System instructions for the role.
    pub instructions: String,
    /// Rendered user prompt.
    pub prompt: String,
    /// JSON Schema the reply must satisfy. `None` asks for free text.
    pub schema: Option<Value>,
    /// Conversation key for backends that keep memory.
    pub user_id: Option<String>,
}

/// Abstraction over language-model backends.
///
/// Implementations return the generated content: a JSON string or value for
/// structured requests, a text string otherwise. Validation is the caller's job.
pub trait Generator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> impl Future<Output = Result<Value>> + Send;
}
