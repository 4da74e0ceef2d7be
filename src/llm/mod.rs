//! Text-completion seam used by the planner and the responder.

use crate::config::LlmConfig;
use crate::shared::logging::{EngineLog, LogLevel};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm is not configured: {0}")]
    NotConfigured(String),
    #[error("llm request failed: {0}")]
    Transport(String),
    #[error("llm returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm response is malformed: {0}")]
    MalformedResponse(String),
}

pub trait ChatModel: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any `/chat/completions` endpoint speaking the OpenAI wire
/// format (OpenRouter by default).
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    base_url: String,
    api_key: Option<String>,
    model: Option<String>,
    temperature: f64,
    agent: ureq::Agent,
    log: EngineLog,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &LlmConfig, timeout: Duration, log: EngineLog) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone().filter(|v| !v.trim().is_empty()),
            model: config.model.clone().filter(|v| !v.trim().is_empty()),
            temperature: config.temperature,
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            log,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    pub fn extract_content(body: &str) -> Result<String, LlmError> {
        let parsed: ChatResponse = serde_json::from_str(body)
            .map_err(|e| LlmError::MalformedResponse(format!("invalid json: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                LlmError::MalformedResponse("missing `choices[0].message.content`".to_string())
            })
    }
}

impl ChatModel for OpenAiCompatibleClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| LlmError::NotConfigured("OPENROUTER_API_KEY is not set".to_string()))?;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| LlmError::NotConfigured("OPENROUTER_MODEL is not set".to_string()))?;

        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };
        let payload = serde_json::to_value(&request)
            .map_err(|e| LlmError::Transport(format!("failed to encode request: {e}")))?;

        self.log.record(
            LogLevel::Debug,
            "llm.request",
            "Sending completion request",
            &[
                ("model", Value::String(model.clone())),
                ("promptChars", Value::from(prompt.chars().count())),
            ],
        );
        let response = match self
            .agent
            .post(&self.endpoint())
            .set("Authorization", &format!("Bearer {api_key}"))
            .send_json(payload)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                self.log
                    .error("llm.request", &format!("Completion failed with status {status}"));
                return Err(LlmError::Status { status, body });
            }
            Err(err) => {
                self.log
                    .error("llm.request", &format!("Completion request failed: {err}"));
                return Err(LlmError::Transport(err.to_string()));
            }
        };
        let body = response
            .into_string()
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        Self::extract_content(&body)
    }
}
