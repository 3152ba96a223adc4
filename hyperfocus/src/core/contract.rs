//! Response contracts: expected output shape plus a deterministic fallback.
//!
//! A contract never fails to produce a value. [`ResponseContract::resolve`]
//! returns the parsed generation when it conforms, and the fallback otherwise.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use jsonschema::{Draft, Validator};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Raw output of a single generation call.
///
/// Produced and consumed within one responder invocation; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub raw: Value,
    pub succeeded: bool,
}

impl GenerationResult {
    pub fn success(raw: Value) -> Self {
        Self {
            raw,
            succeeded: true,
        }
    }

    pub fn failure() -> Self {
        Self {
            raw: Value::Null,
            succeeded: false,
        }
    }
}

/// Why generated content was rejected by a contract.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("generation returned empty content")]
    Empty,
    #[error("generation returned malformed json: {0}")]
    MalformedJson(String),
    #[error("schema validation failed: {}", .0.join("; "))]
    Schema(Vec<String>),
    #[error("content does not match expected type: {0}")]
    Shape(String),
}

struct CompiledSchema {
    raw: Value,
    validator: Validator,
}

/// Expected response shape for one task kind, with its fallback value.
pub struct ResponseContract<T> {
    name: &'static str,
    schema: Option<Arc<CompiledSchema>>,
    fallback: T,
}

impl<T: Clone> Clone for ResponseContract<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            schema: self.schema.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ResponseContract<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseContract")
            .field("name", &self.name)
            .field("structured", &self.schema.is_some())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl<T: DeserializeOwned + Clone> ResponseContract<T> {
    /// Contract for a structured response validated against a JSON Schema (Draft 2020-12).
    pub fn structured(name: &'static str, schema_src: &str, fallback: T) -> Result<Self> {
        let raw: Value = serde_json::from_str(schema_src)
            .with_context(|| format!("parse {name} contract schema"))?;
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&raw)
            .with_context(|| format!("compile {name} contract schema"))?;
        Ok(Self {
            name,
            schema: Some(Arc::new(CompiledSchema { raw, validator })),
            fallback,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// JSON Schema handed to the generation collaborator, if any.
    pub fn schema(&self) -> Option<&Value> {
        self.schema.as_ref().map(|schema| &schema.raw)
    }

    pub fn fallback(&self) -> &T {
        &self.fallback
    }

    /// Same shape, different fallback. Used where the fallback depends on call inputs.
    pub fn with_fallback(&self, fallback: T) -> Self {
        Self {
            name: self.name,
            schema: self.schema.clone(),
            fallback,
        }
    }

    /// Parse and validate generated content.
    pub fn accept(&self, raw: &Value) -> Result<T, ContractViolation> {
        match &self.schema {
            Some(schema) => {
                let instance = normalize_structured(raw)?;
                let messages: Vec<String> = schema
                    .validator
                    .iter_errors(&instance)
                    .map(|err| err.to_string())
                    .collect();
                if !messages.is_empty() {
                    return Err(ContractViolation::Schema(messages));
                }
                serde_json::from_value(instance)
                    .map_err(|err| ContractViolation::Shape(err.to_string()))
            }
            None => {
                let text = match raw {
                    Value::String(text) => text.trim(),
                    Value::Null => return Err(ContractViolation::Empty),
                    other => {
                        return Err(ContractViolation::Shape(format!(
                            "expected text, got {other}"
                        )));
                    }
                };
                if text.is_empty() {
                    return Err(ContractViolation::Empty);
                }
                serde_json::from_value(Value::String(text.to_string()))
                    .map_err(|err| ContractViolation::Shape(err.to_string()))
            }
        }
    }

    /// Resolve a generation into a conforming value, substituting the fallback on failure.
    pub fn resolve(&self, result: GenerationResult) -> T {
        if !result.succeeded {
            debug!(contract = self.name, "generation failed; using fallback");
            return self.fallback.clone();
        }
        match self.accept(&result.raw) {
            Ok(value) => value,
            Err(violation) => {
                warn!(contract = self.name, error = %violation, "contract violation; using fallback");
                self.fallback.clone()
            }
        }
    }
}

impl ResponseContract<String> {
    /// Contract for free-text responses: any non-blank text conforms.
    pub fn text(name: &'static str, fallback: impl Into<String>) -> Self {
        Self {
            name,
            schema: None,
            fallback: fallback.into(),
        }
    }
}

/// Turn generated content into a JSON instance.
///
/// Models in JSON mode return the object as text, sometimes fenced in a
/// markdown code block.
fn normalize_structured(raw: &Value) -> Result<Value, ContractViolation> {
    match raw {
        Value::Null => Err(ContractViolation::Empty),
        Value::String(text) => {
            let body = strip_code_fence(text);
            if body.is_empty() {
                return Err(ContractViolation::Empty);
            }
            serde_json::from_str(body).map_err(|err| ContractViolation::MalformedJson(err.to_string()))
        }
        other => Ok(other.clone()),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
