use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_AGENT_CHANNEL: &str = "agent_channal";

/// Slack channel every agent message lands in unless the plan names another
/// one. Stored in canonical form so the channel normalization rule maps it to
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AgentChannel(String);

impl AgentChannel {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let value = raw.trim();
        if value.is_empty() {
            return Err("agent channel must be non-empty".to_string());
        }
        if value.starts_with('#') {
            return Err("agent channel must not start with `#`".to_string());
        }
        if value == "general" {
            return Err("agent channel must not be `general`".to_string());
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AgentChannel {
    fn default() -> Self {
        Self(DEFAULT_AGENT_CHANNEL.to_string())
    }
}

impl std::fmt::Display for AgentChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for AgentChannel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .map_err(|err| D::Error::custom(format!("invalid agent channel `{raw}`: {err}")))
    }
}
