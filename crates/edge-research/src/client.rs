//! Chat-completions client shared by the default research providers
//!
//! Speaks the OpenAI-compatible `/chat/completions` wire format, which the
//! xAI API (the default backend) also implements. Providers only need two
//! things from it: a completion string and the reasoning-token count for
//! progress reporting.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{ResearchError, Result};

const DEFAULT_API_BASE: &str = "https://api.x.ai/v1";
const DEFAULT_MODEL: &str = "grok-3";
const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Configuration for the research client
#[derive(Debug, Clone)]
pub struct ResearchClientConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the chat-completions API
    ///
    /// Can point at any OpenAI-compatible endpoint (xAI, local vLLM, ...).
    pub api_base: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Request timeout in seconds (default: 180)
    pub timeout_secs: u64,
}

impl ResearchClientConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `XAI_API_KEY`; `XAI_API_BASE` and `XAI_MODEL`
    /// override the defaults when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("XAI_API_KEY").map_err(|_| {
            ResearchError::Configuration("XAI_API_KEY environment variable not set".to_string())
        })?;

        let mut config = Self::new(api_key);
        if let Ok(base) = std::env::var("XAI_API_BASE") {
            config.api_base = base;
        }
        if let Ok(model) = std::env::var("XAI_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Output of one completion call
#[derive(Debug, Clone)]
pub struct CompletionOutput {
    /// Raw assistant message content
    pub content: String,

    /// Reasoning tokens spent, when the backend reports them
    pub reasoning_tokens: Option<u64>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    completion_tokens: Option<u64>,
    #[serde(default)]
    reasoning_tokens: Option<u64>,
}

/// HTTP client for research completions
pub struct ResearchClient {
    client: Client,
    config: ResearchClientConfig,
}

impl ResearchClient {
    /// Create a client with custom configuration
    pub fn with_config(config: ResearchClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(ResearchClientConfig::from_env()?)
    }

    /// Request a JSON-mode completion
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-success status codes, and responses
    /// with no choices.
    pub async fn complete(&self, system: &str, user: &str) -> Result<CompletionOutput> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let url = format!("{}/chat/completions", self.config.api_base);
        debug!(model = %self.config.model, "Sending research completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::RequestFailed(format!(
                "{status}: {body}"
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ResearchError::UnexpectedResponse("no choices".to_string()))?;

        let reasoning_tokens = parsed
            .usage
            .and_then(|u| u.reasoning_tokens.or(u.completion_tokens));

        Ok(CompletionOutput {
            content: choice.message.content,
            reasoning_tokens,
        })
    }
}

/// Extract the first JSON object from possibly-fenced model output
///
/// Models routinely wrap JSON in markdown fences or prepend prose despite
/// being asked for JSON mode; this trims the noise and parses the span from
/// the first `{` to the last `}`.
pub fn extract_json(content: &str) -> Result<Value> {
    let mut clean = content.trim();
    if let Some(stripped) = clean.strip_prefix("```json") {
        clean = stripped;
    } else if let Some(stripped) = clean.strip_prefix("```") {
        clean = stripped;
    }
    if let Some(stripped) = clean.strip_suffix("```") {
        clean = stripped;
    }
    let clean = clean.trim();

    let start = clean.find('{');
    let end = clean.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if end > start => {
            Ok(serde_json::from_str(&clean[start..=end])?)
        }
        _ => Err(ResearchError::UnexpectedResponse(
            "no JSON object found in model output".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ResearchClientConfig::new("key")
            .with_api_base("http://localhost:8000/v1")
            .with_model("test-model")
            .with_timeout(30);
        assert_eq!(config.api_base, "http://localhost:8000/v1");
        assert_eq!(config.model, "test-model");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_extract_json_plain() {
        let value = extract_json(r#"{"a": 1}"#).expect("parses");
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_json_fenced() {
        let value = extract_json("```json\n{\"a\": 1}\n```").expect("parses");
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_json_with_prose() {
        let value =
            extract_json("Here is my analysis:\n{\"a\": 1}\nHope that helps.").expect("parses");
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_json_rejects_garbage() {
        assert!(extract_json("no json here").is_err());
    }
}
