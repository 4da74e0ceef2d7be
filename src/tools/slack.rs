use super::params::SlackPostParams;
use super::{Capability, CapabilityError, ToolError};
use crate::config::SlackConfig;
use crate::shared::logging::{EngineLog, LogLevel};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
struct SlackEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

/// `slack.post`: sends one message through `chat.postMessage` with the bot
/// token.
#[derive(Clone)]
pub struct SlackPoster {
    api_base: String,
    bot_token: Option<String>,
    agent: ureq::Agent,
    log: EngineLog,
}

impl SlackPoster {
    pub fn new(config: &SlackConfig, timeout: Duration, log: EngineLog) -> Self {
        Self {
            api_base: config.api_base.clone(),
            bot_token: config
                .bot_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            log,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }

    pub fn post_message(&self, channel: &str, text: &str) -> Result<String, CapabilityError> {
        let Some(token) = self.bot_token.as_ref() else {
            self.log.error("slack.post", "Slack bot token not configured");
            return Err(CapabilityError::NotConfigured(
                "Slack bot token not configured".to_string(),
            ));
        };

        self.log.record(
            LogLevel::Info,
            "slack.post",
            &format!("Posting Slack message to {channel}"),
            &[("channel", Value::String(channel.to_string()))],
        );
        let response = self
            .agent
            .post(&self.endpoint("chat.postMessage"))
            .set("Authorization", &format!("Bearer {token}"))
            .send_json(json!({ "channel": channel, "text": text }))
            .map_err(|e| CapabilityError::Request(format!("Error sending Slack message: {e}")))?;
        let envelope: SlackEnvelope = response
            .into_json()
            .map_err(|e| CapabilityError::Request(format!("Error sending Slack message: {e}")))?;

        if !envelope.ok {
            let error = envelope
                .error
                .unwrap_or_else(|| "chat.postMessage failed".to_string());
            self.log
                .error("slack.post", &format!("Slack API error: {error}"));
            return Err(CapabilityError::Rejected(format!("Slack API error: {error}")));
        }

        self.log.record(
            LogLevel::Info,
            "slack.post",
            "Message sent successfully",
            &[("ts", Value::String(envelope.ts.unwrap_or_default()))],
        );
        Ok(format!("Slack message sent to {channel}: {text}"))
    }
}

impl Capability for SlackPoster {
    fn invoke(&self, params: &Map<String, Value>) -> Result<String, ToolError> {
        let params = SlackPostParams::from_params(params)?;
        Ok(self.post_message(&params.channel, &params.text)?)
    }
}
