use super::{default_state_root, AgentChannel, ConfigError};
use crate::shared::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub state_root: Option<PathBuf>,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: None,
            model: None,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SlackConfig {
    #[serde(default = "default_slack_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub agent_channel: AgentChannel,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base: default_slack_api_base(),
            bot_token: None,
            agent_channel: AgentChannel::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JiraConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_jira_project")]
    pub default_project: String,
    #[serde(default = "default_jira_issue_type")]
    pub issue_type: String,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            email: None,
            api_token: None,
            default_project: default_jira_project(),
            issue_type: default_jira_issue_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CalendarConfig {
    #[serde(default = "default_calendar_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub events_path: Option<PathBuf>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: default_calendar_timezone(),
            events_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub mailbox_root: Option<PathBuf>,
    #[serde(default = "default_email_folder")]
    pub default_folder: String,
    #[serde(default = "default_email_limit")]
    pub default_limit: usize,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            mailbox_root: None,
            default_folder: default_email_folder(),
            default_limit: default_email_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MemoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recall_limit: default_recall_limit(),
            db_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_llm_base_url() -> String {
    DEFAULT_LLM_BASE_URL.to_string()
}

fn default_slack_api_base() -> String {
    DEFAULT_SLACK_API_BASE.to_string()
}

fn default_jira_project() -> String {
    "PROJ".to_string()
}

fn default_jira_issue_type() -> String {
    "Task".to_string()
}

fn default_calendar_timezone() -> String {
    "UTC".to_string()
}

fn default_email_folder() -> String {
    "inbox".to_string()
}

fn default_email_limit() -> usize {
    10
}

fn default_recall_limit() -> usize {
    3
}

fn default_timeout_seconds() -> u64 {
    30
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Deployment values and secrets come from the environment and win over
    /// the settings file.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        if let Some(value) = get("TASKPILOT_STATE_ROOT") {
            self.state_root = Some(PathBuf::from(value));
        }
        if let Some(value) = get("OPENROUTER_API_KEY") {
            self.llm.api_key = Some(value);
        }
        if let Some(value) = get("OPENROUTER_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = get("OPENROUTER_MODEL") {
            self.llm.model = Some(value);
        }
        if let Some(value) = get("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(value);
        }
        if let Some(value) = get("SLACK_API_BASE") {
            self.slack.api_base = value;
        }
        if let Some(value) = get("SLACK_DEFAULT_CHANNEL") {
            self.slack.agent_channel =
                AgentChannel::parse(&value).map_err(|reason| ConfigError::InvalidEnvVar {
                    key: "SLACK_DEFAULT_CHANNEL".to_string(),
                    value: value.clone(),
                    reason,
                })?;
        }
        if let Some(value) = get("JIRA_BASE_URL") {
            self.jira.base_url = Some(value);
        }
        if let Some(value) = get("JIRA_EMAIL") {
            self.jira.email = Some(value);
        }
        if let Some(value) = get("JIRA_API_TOKEN") {
            self.jira.api_token = Some(value);
        }
        if let Some(value) = get("LOG_LEVEL") {
            self.logging.level =
                LogLevel::parse(&value).map_err(|reason| ConfigError::InvalidEnvVar {
                    key: "LOG_LEVEL".to_string(),
                    value: value.clone(),
                    reason,
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(state_root) = &self.state_root {
            if !state_root.is_absolute() {
                return Err(ConfigError::Settings(
                    "`state_root` must be an absolute path".to_string(),
                ));
            }
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`llm.base_url` must be non-empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Settings(
                "`llm.temperature` must be between 0 and 2".to_string(),
            ));
        }
        if self.slack.api_base.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`slack.api_base` must be non-empty".to_string(),
            ));
        }
        if self.jira.default_project.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`jira.default_project` must be non-empty".to_string(),
            ));
        }
        if self.jira.issue_type.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`jira.issue_type` must be non-empty".to_string(),
            ));
        }
        self.calendar
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| {
                ConfigError::Settings(format!(
                    "`calendar.timezone` `{}` is not a known IANA timezone",
                    self.calendar.timezone
                ))
            })?;
        if self.email.default_folder.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`email.default_folder` must be non-empty".to_string(),
            ));
        }
        if self.email.default_limit == 0 {
            return Err(ConfigError::Settings(
                "`email.default_limit` must be > 0".to_string(),
            ));
        }
        if self.memory.recall_limit == 0 {
            return Err(ConfigError::Settings(
                "`memory.recall_limit` must be > 0".to_string(),
            ));
        }
        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::Settings(
                "`http.timeout_seconds` must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn resolve_state_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.state_root {
            Some(path) => Ok(path.clone()),
            None => default_state_root(),
        }
    }

    pub fn resolve_memory_db_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.memory.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(self.resolve_state_root()?.join("memory/memory.db")),
        }
    }

    pub fn resolve_calendar_events_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.calendar.events_path {
            Some(path) => Ok(path.clone()),
            None => Ok(self.resolve_state_root()?.join("calendar/events.jsonl")),
        }
    }

    pub fn resolve_mailbox_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.email.mailbox_root {
            Some(path) => Ok(path.clone()),
            None => Ok(self.resolve_state_root()?.join("mailbox")),
        }
    }
}
