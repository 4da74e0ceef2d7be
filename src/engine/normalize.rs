use crate::config::AgentChannel;
use crate::tools::ToolName;
use serde_json::{Map, Value};

/// Rewrites planner-produced parameters into the shape each capability
/// expects. Pure and idempotent; never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterNormalizer {
    agent_channel: AgentChannel,
}

impl Default for ParameterNormalizer {
    fn default() -> Self {
        Self::new(AgentChannel::default())
    }
}

impl ParameterNormalizer {
    pub fn new(agent_channel: AgentChannel) -> Self {
        Self { agent_channel }
    }

    pub fn agent_channel(&self) -> &AgentChannel {
        &self.agent_channel
    }

    pub fn normalize(&self, tool: &str, params: &Map<String, Value>) -> Map<String, Value> {
        let mut normalized = params.clone();
        match ToolName::parse(tool) {
            Some(ToolName::SlackPost) => self.normalize_slack_post(&mut normalized),
            Some(ToolName::JiraCreate) => rename_if_absent(&mut normalized, "project", "project_key"),
            Some(ToolName::EmailRead) | Some(ToolName::CalendarCreate) | None => {}
        }
        normalized
    }

    fn normalize_slack_post(&self, params: &mut Map<String, Value>) {
        rename_if_absent(params, "message", "text");
        let channel = match params.get("channel") {
            Some(Value::String(raw)) => self.canonical_channel(raw),
            _ => self.agent_channel.to_string(),
        };
        params.insert("channel".to_string(), Value::String(channel));
    }

    fn canonical_channel(&self, raw: &str) -> String {
        let channel = raw.trim_start_matches('#');
        if channel.is_empty() || channel == "general" {
            self.agent_channel.to_string()
        } else {
            channel.to_string()
        }
    }
}

fn rename_if_absent(params: &mut Map<String, Value>, from: &str, to: &str) {
    if params.contains_key(to) {
        return;
    }
    if let Some(value) = params.remove(from) {
        params.insert(to.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn message_is_renamed_only_when_text_is_absent() {
        let normalizer = ParameterNormalizer::default();
        let out = normalizer.normalize("slack.post", &map(json!({"message": "a", "text": "b"})));
        assert_eq!(out["text"], "b");
        assert_eq!(out["message"], "a");
    }

    #[test]
    fn only_leading_hashes_are_stripped_from_channels() {
        let normalizer = ParameterNormalizer::default();
        let cases = [
            ("##ops", "ops"),
            ("#ops#", "ops#"),
            (" ops ", " ops "),
            ("# general", " general"),
            (" ##ops ", " ##ops "),
            ("#", "agent_channal"),
            ("###general", "agent_channal"),
        ];
        for (raw, expected) in cases {
            let out = normalizer.normalize("slack.post", &map(json!({"text": "x", "channel": raw})));
            assert_eq!(out["channel"], expected, "channel {raw:?}");
        }
    }

    #[test]
    fn non_string_channel_falls_back_to_agent_channel() {
        let normalizer =
            ParameterNormalizer::new(AgentChannel::parse("bots").expect("channel"));
        let out = normalizer.normalize("slack.post", &map(json!({"text": "x", "channel": 7})));
        assert_eq!(out["channel"], "bots");
    }

    #[test]
    fn project_key_wins_over_project() {
        let normalizer = ParameterNormalizer::default();
        let out = normalizer.normalize(
            "jira.create",
            &map(json!({"project": "OLD", "project_key": "NEW"})),
        );
        assert_eq!(out["project_key"], "NEW");
        assert_eq!(out["project"], "OLD");
    }

    #[test]
    fn other_tools_pass_through_untouched() {
        let normalizer = ParameterNormalizer::default();
        let params = map(json!({"message": "x", "channel": "#general"}));
        assert_eq!(normalizer.normalize("email.read", &params), params);
        assert_eq!(normalizer.normalize("bogus.tool", &params), params);
    }
}
