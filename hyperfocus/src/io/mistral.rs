//! Mistral chat completions backend.
//!
//! Works with the Mistral API and compatible endpoints. Structured requests use
//! JSON schema response mode; replies are returned as raw text for the caller's
//! contract to validate.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use reqwest::header::{self, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::io::config::GenerationConfig;
use crate::io::generator::{GenerationRequest, Generator};
use crate::io::memory::{ConversationMemory, Exchange};

/// Generator backed by a Mistral-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct MistralGenerator {
    client: Client,
    headers: HeaderMap,
    endpoint: String,
    temperature: f32,
    max_tokens: u32,
    memory: Option<Arc<ConversationMemory>>,
}

impl MistralGenerator {
    /// Create a generator with an explicit API key.
    pub fn new(config: &GenerationConfig, key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse()?);
        headers.insert(header::ACCEPT, "application/json".parse()?);
        headers.insert(header::AUTHORIZATION, format!("Bearer {key}").parse()?);
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            headers,
            endpoint: config.endpoint.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            memory: None,
        })
    }

    /// Create a generator reading the API key from the configured environment variable.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let key = config.api_key()?;
        Self::new(config, &key)
    }

    /// Replay and record per-user history for requests that carry a user id.
    pub fn with_memory(mut self, memory: Arc<ConversationMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn memory(&self) -> Option<&Arc<ConversationMemory>> {
        self.memory.as_ref()
    }

    fn body<'a>(&self, request: &'a GenerationRequest, history: &'a [Exchange]) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(ChatMessage::new("system", &request.instructions));
        for exchange in history {
            messages.push(ChatMessage::new("user", &exchange.prompt));
            messages.push(ChatMessage::new("assistant", &exchange.reply));
        }
        messages.push(ChatMessage::new("user", &request.prompt));
        let response_format = request.schema.as_ref().map(|schema| {
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": request.role.as_str(),
                    "schema": schema,
                    "strict": true,
                },
            })
        });
        ChatRequest {
            model: &request.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format,
        }
    }
}

impl Generator for MistralGenerator {
    #[instrument(skip_all, fields(role = %request.role, model = %request.model, structured = request.schema.is_some()))]
    async fn generate(&self, request: &GenerationRequest) -> Result<Value> {
        let history = match (&self.memory, &request.user_id) {
            (Some(memory), Some(user_id)) => memory.history(user_id).await,
            _ => Vec::new(),
        };
        let body = self.body(request, &history);
        debug!(messages = body.messages.len(), "sending chat completion");

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .context("send chat completion")?;
        let status = response.status();
        let text = response.text().await.context("read chat completion")?;
        if !status.is_success() {
            return Err(anyhow!("chat completion failed with status {status}: {text}"));
        }
        let content = parse_content(&text)?;
        debug!(bytes = content.len(), "chat completion received");

        if let (Some(memory), Some(user_id)) = (&self.memory, &request.user_id) {
            memory
                .record(
                    user_id,
                    Exchange {
                        prompt: request.prompt.clone(),
                        reply: content.clone(),
                    },
                )
                .await;
        }
        Ok(Value::String(content))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatMessage<'a> {
    fn new(role: &'static str, content: &'a str) -> Self {
        Self { role, content }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the first choice's text from a chat completion response body.
fn parse_content(body: &str) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_str(body).context("parse chat completion response")?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("chat completion returned no content"))?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Role;

    fn generator() -> MistralGenerator {
        MistralGenerator::new(&GenerationConfig::default(), "test-key").expect("generator")
    }

    fn request(schema: Option<Value>, user_id: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            role: Role::Categorizer,
            model: "mistral-small-latest".to_string(),
            instructions: "sort tasks".to_string(),
            prompt: "write report".to_string(),
            schema,
            user_id: user_id.map(str::to_string),
        }
    }

    #[test]
    fn new_uses_configured_endpoint() {
        let mut config = GenerationConfig::default();
        config.endpoint = "http://localhost:9999/v1/chat/completions".to_string();
        let generator = MistralGenerator::new(&config, "test-key").expect("generator");
        assert_eq!(generator.endpoint(), config.endpoint);
        assert!(generator.memory().is_none());
    }

    #[test]
    fn structured_request_asks_for_json_schema() {
        let generator = generator();
        let schema = json!({"type": "object"});
        let req = request(Some(schema.clone()), None);
        let body = serde_json::to_value(generator.body(&req, &[])).expect("serialize");

        assert_eq!(body["model"], "mistral-small-latest");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "write report");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "categorizer");
        assert_eq!(body["response_format"]["json_schema"]["schema"], schema);
    }

    #[test]
    fn text_request_replays_history_before_prompt() {
        let generator = generator();
        let req = request(None, Some("ada"));
        let history = vec![Exchange {
            prompt: "earlier".to_string(),
            reply: "answer".to_string(),
        }];
        let body = serde_json::to_value(generator.body(&req, &history)).expect("serialize");

        let roles: Vec<&str> = body["messages"]
            .as_array()
            .expect("messages")
            .iter()
            .map(|m| m["role"].as_str().expect("role"))
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn parses_first_choice_content() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Take a walk."}}]}"#;
        assert_eq!(parse_content(body).expect("content"), "Take a walk.");
    }

    #[test]
    fn missing_content_is_an_error() {
        assert!(parse_content(r#"{"choices":[]}"#).is_err());
        assert!(parse_content(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#).is_err());
        assert!(parse_content("not json").is_err());
    }
}
