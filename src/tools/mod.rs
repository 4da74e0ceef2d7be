//! Tool registry: the closed set of built-in capabilities, their parameter
//! contracts, and the lookup the step executor resolves tool names through.

use crate::config::{ConfigError, Settings};
use crate::shared::logging::EngineLog;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

pub mod calendar;
pub mod email;
pub mod jira;
pub mod params;
pub mod slack;

pub use calendar::CalendarStore;
pub use email::MailboxReader;
pub use jira::JiraClient;
pub use params::ParameterError;
pub use slack::SlackPoster;

#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("{0}")]
    NotConfigured(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("{0}")]
    Rejected(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool `{name}` is not registered")]
    NotFound { name: String },
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// Uniform invocation contract every tool implementation exposes.
pub trait Capability: Send + Sync {
    fn invoke(&self, params: &Map<String, Value>) -> Result<String, ToolError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolName {
    SlackPost,
    JiraCreate,
    EmailRead,
    CalendarCreate,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::SlackPost,
        ToolName::EmailRead,
        ToolName::JiraCreate,
        ToolName::CalendarCreate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SlackPost => "slack.post",
            Self::JiraCreate => "jira.create",
            Self::EmailRead => "email.read",
            Self::CalendarCreate => "calendar.create",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "slack.post" => Some(Self::SlackPost),
            "jira.create" => Some(Self::JiraCreate),
            "email.read" => Some(Self::EmailRead),
            "calendar.create" => Some(Self::CalendarCreate),
            _ => None,
        }
    }

    pub fn accepts(self) -> &'static [&'static str] {
        match self {
            Self::SlackPost => &["channel", "text"],
            Self::JiraCreate => &["summary", "description", "project_key"],
            Self::EmailRead => &["folder", "limit"],
            Self::CalendarCreate => &["title", "start_time", "end_time"],
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Self::SlackPost => "Post a message to a Slack channel",
            Self::JiraCreate => "Create a Jira ticket",
            Self::EmailRead => "Read recent messages from a mailbox folder",
            Self::CalendarCreate => "Create a calendar event",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub summary: String,
    pub accepts: BTreeSet<String>,
    pub capability: Arc<dyn Capability>,
}

impl ToolDescriptor {
    pub fn new(
        name: &str,
        summary: &str,
        accepts: &[&str],
        capability: Arc<dyn Capability>,
    ) -> Self {
        Self {
            name: name.to_string(),
            summary: summary.to_string(),
            accepts: accepts.iter().map(|arg| arg.to_string()).collect(),
            capability,
        }
    }

    pub fn builtin(tool: ToolName, capability: Arc<dyn Capability>) -> Self {
        Self::new(tool.as_str(), tool.summary(), tool.accepts(), capability)
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("summary", &self.summary)
            .field("accepts", &self.accepts)
            .finish_non_exhaustive()
    }
}

/// Name-keyed descriptor table. Populated before the registry is shared;
/// read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any descriptor already registered under the same name.
    pub fn register(&mut self, descriptor: ToolDescriptor) {
        self.tools.insert(descriptor.name.clone(), descriptor);
    }

    pub fn with(mut self, descriptor: ToolDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<&ToolDescriptor, ToolError> {
        self.tools.get(name).ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
        })
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Builds the four built-in capabilities from settings. Integration clients
/// are constructed once here and owned by their capability.
pub fn build_default_registry(
    settings: &Settings,
    log: &EngineLog,
) -> Result<ToolRegistry, ConfigError> {
    let timeout = Duration::from_secs(settings.http.timeout_seconds);
    let calendar = CalendarStore::new(
        settings.resolve_calendar_events_path()?,
        &settings.calendar.timezone,
        log.clone(),
    )
    .map_err(ConfigError::Settings)?;
    let mailbox = MailboxReader::new(
        settings.resolve_mailbox_root()?,
        &settings.email.default_folder,
        settings.email.default_limit,
        log.clone(),
    );

    Ok(ToolRegistry::new()
        .with(ToolDescriptor::builtin(
            ToolName::SlackPost,
            Arc::new(SlackPoster::new(&settings.slack, timeout, log.clone())),
        ))
        .with(ToolDescriptor::builtin(
            ToolName::JiraCreate,
            Arc::new(JiraClient::new(&settings.jira, timeout, log.clone())),
        ))
        .with(ToolDescriptor::builtin(
            ToolName::EmailRead,
            Arc::new(mailbox),
        ))
        .with(ToolDescriptor::builtin(
            ToolName::CalendarCreate,
            Arc::new(calendar),
        )))
}
