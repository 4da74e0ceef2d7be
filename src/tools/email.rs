use super::params::EmailReadParams;
use super::{Capability, CapabilityError, ToolError};
use crate::shared::logging::{EngineLog, LogLevel};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    pub from: String,
    pub subject: String,
}

/// Reads the header block of an RFC 5322 message. Folded header lines are
/// joined onto the previous header.
pub fn parse_headers(raw: &str) -> MessageSummary {
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }
    let header = |name: &str, fallback: &str| {
        headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };
    MessageSummary {
        from: header("from", "(unknown sender)"),
        subject: header("subject", "(no subject)"),
    }
}

/// `email.read`: lists the newest `.eml` files in a mailbox folder.
#[derive(Debug, Clone)]
pub struct MailboxReader {
    root: PathBuf,
    default_folder: String,
    default_limit: usize,
    log: EngineLog,
}

impl MailboxReader {
    pub fn new(root: PathBuf, default_folder: &str, default_limit: usize, log: EngineLog) -> Self {
        Self {
            root,
            default_folder: default_folder.to_string(),
            default_limit,
            log,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_error(path: &Path, source: std::io::Error) -> CapabilityError {
        CapabilityError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn newest_messages(
        &self,
        folder_path: &Path,
        limit: usize,
    ) -> Result<Vec<PathBuf>, CapabilityError> {
        let mut messages: Vec<(SystemTime, PathBuf)> = Vec::new();
        let entries = fs::read_dir(folder_path).map_err(|e| Self::io_error(folder_path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Self::io_error(folder_path, e))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("eml") {
                continue;
            }
            let metadata = entry.metadata().map_err(|e| Self::io_error(&path, e))?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            messages.push((modified, path));
        }
        messages.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        messages.truncate(limit);
        Ok(messages.into_iter().map(|(_, path)| path).collect())
    }

    pub fn read_folder(&self, params: &EmailReadParams) -> Result<String, CapabilityError> {
        let folder = params
            .folder
            .clone()
            .unwrap_or_else(|| self.default_folder.clone());
        let limit = params.limit.unwrap_or(self.default_limit);
        let folder_path = self.root.join(&folder);
        if !folder_path.is_dir() {
            let message = format!("Mailbox folder not found: {folder}");
            self.log.error("email.read", &message);
            return Err(CapabilityError::Rejected(message));
        }

        let paths = self.newest_messages(&folder_path, limit)?;
        self.log.record(
            LogLevel::Info,
            "email.read",
            &format!("Reading {} message(s) from {folder}", paths.len()),
            &[("folder", Value::String(folder.clone()))],
        );
        if paths.is_empty() {
            return Ok(format!("No messages in {folder}"));
        }

        let mut lines = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(&path).map_err(|e| Self::io_error(&path, e))?;
            let summary = parse_headers(&String::from_utf8_lossy(&bytes));
            lines.push(format!("From: {} | Subject: {}", summary.from, summary.subject));
        }
        Ok(lines.join("\n"))
    }
}

impl Capability for MailboxReader {
    fn invoke(&self, params: &Map<String, Value>) -> Result<String, ToolError> {
        let params = EmailReadParams::from_params(params)?;
        Ok(self.read_folder(&params)?)
    }
}
