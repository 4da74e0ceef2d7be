use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err("log level must be one of: debug, info, warn, error".to_string()),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn engine_log_path(state_root: &Path) -> PathBuf {
    state_root.join("logs/engine.log")
}

pub fn append_json_line(path: &Path, payload: &Value) -> std::io::Result<()> {
    let line = serde_json::to_string(payload).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

/// JSON-lines event sink shared by the engine, the collaborators and the
/// capabilities. Write failures are swallowed: logging never fails a run.
#[derive(Debug, Clone)]
pub struct EngineLog {
    path: Option<PathBuf>,
    min_level: LogLevel,
    run_id: Option<String>,
}

impl EngineLog {
    pub fn to_file(path: PathBuf, min_level: LogLevel) -> Self {
        Self {
            path: Some(path),
            min_level,
            run_id: None,
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            min_level: LogLevel::Error,
            run_id: None,
        }
    }

    pub fn with_run_id(&self, run_id: &str) -> Self {
        let mut scoped = self.clone();
        scoped.run_id = Some(run_id.to_string());
        scoped
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.path.is_some() && level >= self.min_level
    }

    pub fn record(&self, level: LogLevel, event: &str, message: &str, fields: &[(&str, Value)]) {
        if !self.enabled(level) {
            return;
        }
        let Some(path) = self.path.as_ref() else {
            return;
        };

        let mut payload = Map::new();
        payload.insert(
            "timestamp".to_string(),
            Value::from(chrono::Utc::now().timestamp()),
        );
        payload.insert("level".to_string(), Value::String(level.to_string()));
        payload.insert("event".to_string(), Value::String(event.to_string()));
        payload.insert("message".to_string(), Value::String(message.to_string()));
        if let Some(run_id) = self.run_id.as_ref() {
            payload.insert("runId".to_string(), Value::String(run_id.clone()));
        }
        for (key, value) in fields {
            payload.insert((*key).to_string(), value.clone());
        }

        let _ = append_json_line(path, &Value::Object(payload));
    }

    pub fn debug(&self, event: &str, message: &str) {
        self.record(LogLevel::Debug, event, message, &[]);
    }

    pub fn info(&self, event: &str, message: &str) {
        self.record(LogLevel::Info, event, message, &[]);
    }

    pub fn warn(&self, event: &str, message: &str) {
        self.record(LogLevel::Warn, event, message, &[]);
    }

    pub fn error(&self, event: &str, message: &str) {
        self.record(LogLevel::Error, event, message, &[]);
    }
}
