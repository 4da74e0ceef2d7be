use super::params::{CalendarCreateParams, ParameterError};
use super::{Capability, CapabilityError, ToolError};
use crate::shared::logging::{append_json_line, EngineLog, LogLevel};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub created_at: i64,
}

/// `calendar.create`: appends events to a local JSONL calendar.
#[derive(Debug, Clone)]
pub struct CalendarStore {
    events_path: PathBuf,
    timezone: Tz,
    log: EngineLog,
}

impl CalendarStore {
    pub fn new(events_path: PathBuf, timezone: &str, log: EngineLog) -> Result<Self, String> {
        let timezone = timezone
            .parse::<Tz>()
            .map_err(|_| format!("`calendar.timezone` `{timezone}` is not a known IANA timezone"))?;
        Ok(Self {
            events_path,
            timezone,
            log,
        })
    }

    pub fn events_path(&self) -> &Path {
        &self.events_path
    }

    /// RFC 3339 keeps its own offset; naive times are read in the configured
    /// zone.
    pub fn parse_time(&self, arg: &str, raw: &str) -> Result<DateTime<FixedOffset>, ParameterError> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed);
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return self
                    .timezone
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|local| local.fixed_offset())
                    .ok_or_else(|| ParameterError::InvalidValue {
                        arg: arg.to_string(),
                        reason: format!("`{raw}` does not exist in {}", self.timezone.name()),
                    });
            }
        }
        Err(ParameterError::InvalidValue {
            arg: arg.to_string(),
            reason: format!("`{raw}` is not an ISO 8601 date-time"),
        })
    }

    pub fn create_event(&self, params: &CalendarCreateParams) -> Result<String, ToolError> {
        let start = params
            .start_time
            .as_deref()
            .map(|raw| self.parse_time("start_time", raw))
            .transpose()?;
        let end = params
            .end_time
            .as_deref()
            .map(|raw| self.parse_time("end_time", raw))
            .transpose()?;
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(ParameterError::InvalidValue {
                    arg: "end_time".to_string(),
                    reason: "end_time must not be before start_time".to_string(),
                }
                .into());
            }
        }

        let event = CalendarEvent {
            title: params.title.clone(),
            start_time: start.map(|t| t.to_rfc3339()),
            end_time: end.map(|t| t.to_rfc3339()),
            created_at: Utc::now().timestamp(),
        };
        let payload = serde_json::to_value(&event).map_err(|e| {
            CapabilityError::Rejected(format!("failed to encode calendar event: {e}"))
        })?;
        append_json_line(&self.events_path, &payload).map_err(|source| CapabilityError::Io {
            path: self.events_path.display().to_string(),
            source,
        })?;

        self.log.record(
            LogLevel::Info,
            "calendar.create",
            &format!("Calendar event created: {}", event.title),
            &[("path", Value::String(self.events_path.display().to_string()))],
        );

        Ok(format!("Calendar event created: {}", event.title))
    }
}

impl Capability for CalendarStore {
    fn invoke(&self, params: &Map<String, Value>) -> Result<String, ToolError> {
        let params = CalendarCreateParams::from_params(params)?;
        self.create_event(&params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn store(root: &Path, timezone: &str) -> CalendarStore {
        CalendarStore::new(
            root.join("calendar/events.jsonl"),
            timezone,
            EngineLog::disabled(),
        )
        .expect("store")
    }

    #[test]
    fn title_only_event_uses_default_title() {
        let temp = tempdir().expect("tempdir");
        let calendar = store(temp.path(), "UTC");
        let message = calendar.invoke(&Map::new()).expect("created");
        assert_eq!(message, "Calendar event created: Meeting");

        let raw = fs::read_to_string(calendar.events_path()).expect("events");
        let event: CalendarEvent = serde_json::from_str(raw.trim()).expect("event");
        assert_eq!(event.title, "Meeting");
        assert_eq!(event.start_time, None);
    }

    #[test]
    fn naive_times_use_configured_timezone() {
        let temp = tempdir().expect("tempdir");
        let calendar = store(temp.path(), "Europe/Berlin");
        let params = json!({
            "title": "Standup",
            "start_time": "2025-01-15T09:00",
            "end_time": "2025-01-15T09:15:00+01:00",
        });
        let message = calendar
            .invoke(params.as_object().expect("object"))
            .expect("created");
        assert_eq!(message, "Calendar event created: Standup");

        let written = fs::read_to_string(calendar.events_path()).expect("events");
        let event: Value = serde_json::from_str(written.trim()).expect("event json");
        assert_eq!(event["startTime"], "2025-01-15T09:00:00+01:00");
        assert_eq!(event["endTime"], "2025-01-15T09:15:00+01:00");
    }

    #[test]
    fn end_before_start_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let calendar = store(temp.path(), "UTC");
        let params = json!({
            "start_time": "2025-01-15T10:00:00Z",
            "end_time": "2025-01-15T09:00:00Z",
        });
        let err = calendar
            .invoke(params.as_object().expect("object"))
            .expect_err("inverted range");
        assert!(matches!(
            err,
            ToolError::Parameter(ParameterError::InvalidValue { .. })
        ));
        assert!(!calendar.events_path().exists());
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = CalendarStore::new(
            PathBuf::from("/tmp/events.jsonl"),
            "Mars/Olympus",
            EngineLog::disabled(),
        )
        .expect_err("bad tz");
        assert!(err.contains("Mars/Olympus"));
    }
}
