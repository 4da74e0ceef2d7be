pub mod error;
pub mod load;
pub mod paths;
pub mod settings;
pub mod typed_fields;

pub use error::ConfigError;
pub use load::load_settings;
pub use paths::{
    default_global_config_path, default_state_root, GLOBAL_SETTINGS_FILE_NAME, GLOBAL_STATE_DIR,
};
pub use settings::{
    CalendarConfig, EmailConfig, HttpConfig, JiraConfig, LlmConfig, LoggingConfig, MemoryConfig,
    Settings, SlackConfig, DEFAULT_LLM_BASE_URL, DEFAULT_SLACK_API_BASE,
};
pub use typed_fields::{AgentChannel, DEFAULT_AGENT_CHANNEL};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::logging::LogLevel;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_settings_file_uses_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.yaml");
        fs::write(&path, "").expect("write");

        let settings = Settings::from_path(&path).expect("settings");
        assert_eq!(settings.slack.agent_channel.as_str(), DEFAULT_AGENT_CHANNEL);
        assert_eq!(settings.llm.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(settings.jira.default_project, "PROJ");
        assert_eq!(settings.memory.recall_limit, 3);
        assert_eq!(settings.http.timeout_seconds, 30);
        settings.validate().expect("defaults are valid");
    }

    #[test]
    fn yaml_sections_override_defaults() {
        let settings: Settings = serde_yaml::from_str(
            r#"
state_root: /tmp/taskpilot
slack:
  agent_channel: ops-bots
jira:
  default_project: KAN
logging:
  level: debug
"#,
        )
        .expect("parse");

        assert_eq!(settings.state_root, Some(PathBuf::from("/tmp/taskpilot")));
        assert_eq!(settings.slack.agent_channel.as_str(), "ops-bots");
        assert_eq!(settings.jira.default_project, "KAN");
        assert_eq!(settings.logging.level, LogLevel::Debug);
        assert_eq!(settings.jira.issue_type, "Task");
    }

    #[test]
    fn non_canonical_agent_channel_is_rejected_at_parse_time() {
        let err = serde_yaml::from_str::<Settings>("slack:\n  agent_channel: \"#general\"\n")
            .expect_err("leading hash must fail");
        assert!(err.to_string().contains("invalid agent channel"));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut settings = Settings::default();
        settings
            .apply_overrides_from(lookup(&[
                ("OPENROUTER_API_KEY", "sk-test"),
                ("OPENROUTER_MODEL", "openai/gpt-4o-mini"),
                ("SLACK_BOT_TOKEN", "xoxb-1"),
                ("SLACK_DEFAULT_CHANNEL", "alerts"),
                ("JIRA_BASE_URL", "https://example.atlassian.net"),
                ("LOG_LEVEL", "WARNING"),
                ("TASKPILOT_STATE_ROOT", "/var/lib/taskpilot"),
                ("JIRA_EMAIL", "   "),
            ]))
            .expect("overrides");

        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.llm.model.as_deref(), Some("openai/gpt-4o-mini"));
        assert_eq!(settings.slack.bot_token.as_deref(), Some("xoxb-1"));
        assert_eq!(settings.slack.agent_channel.as_str(), "alerts");
        assert_eq!(
            settings.jira.base_url.as_deref(),
            Some("https://example.atlassian.net")
        );
        assert_eq!(settings.jira.email, None);
        assert_eq!(settings.logging.level, LogLevel::Warn);
        assert_eq!(
            settings.resolve_state_root().expect("state root"),
            PathBuf::from("/var/lib/taskpilot")
        );
    }

    #[test]
    fn invalid_env_channel_reports_key() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides_from(lookup(&[("SLACK_DEFAULT_CHANNEL", "#general")]))
            .expect_err("invalid channel");
        assert!(err.to_string().contains("SLACK_DEFAULT_CHANNEL"));
    }

    #[test]
    fn validation_rejects_zero_limits_and_unknown_timezone() {
        let mut settings = Settings::default();
        settings.http.timeout_seconds = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.memory.recall_limit = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.calendar.timezone = "Mars/Olympus".to_string();
        let err = settings.validate().expect_err("timezone");
        assert!(err.to_string().contains("calendar.timezone"));

        let mut settings = Settings::default();
        settings.state_root = Some(PathBuf::from("relative/root"));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn derived_paths_live_under_state_root() {
        let settings = Settings {
            state_root: Some(PathBuf::from("/srv/tp")),
            ..Settings::default()
        };
        assert_eq!(
            settings.resolve_memory_db_path().expect("db"),
            PathBuf::from("/srv/tp/memory/memory.db")
        );
        assert_eq!(
            settings.resolve_calendar_events_path().expect("calendar"),
            PathBuf::from("/srv/tp/calendar/events.jsonl")
        );
        assert_eq!(
            settings.resolve_mailbox_root().expect("mailbox"),
            PathBuf::from("/srv/tp/mailbox")
        );
    }
}
