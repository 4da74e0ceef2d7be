use serde_json::{Map, Value};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    #[error("missing required argument `{arg}`")]
    Missing { arg: String },
    #[error("unexpected argument `{arg}`")]
    Unexpected { arg: String },
    #[error("invalid argument type for `{arg}`; expected {expected}")]
    InvalidType { arg: String, expected: String },
    #[error("invalid value for `{arg}`: {reason}")]
    InvalidValue { arg: String, reason: String },
}

pub fn reject_unexpected(
    params: &Map<String, Value>,
    accepts: &BTreeSet<String>,
) -> Result<(), ParameterError> {
    match params.keys().find(|key| !accepts.contains(key.as_str())) {
        Some(key) => Err(ParameterError::Unexpected { arg: key.clone() }),
        None => Ok(()),
    }
}

/// Scalars are accepted as text; `null` counts as absent.
pub fn optional_string(
    params: &Map<String, Value>,
    arg: &str,
) -> Result<Option<String>, ParameterError> {
    match params.get(arg) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(Value::Number(value)) => Ok(Some(value.to_string())),
        Some(Value::Bool(value)) => Ok(Some(value.to_string())),
        Some(_) => Err(ParameterError::InvalidType {
            arg: arg.to_string(),
            expected: "string".to_string(),
        }),
    }
}

pub fn required_string(params: &Map<String, Value>, arg: &str) -> Result<String, ParameterError> {
    optional_string(params, arg)?.ok_or_else(|| ParameterError::Missing {
        arg: arg.to_string(),
    })
}

pub fn optional_count(
    params: &Map<String, Value>,
    arg: &str,
) -> Result<Option<usize>, ParameterError> {
    let invalid_type = || ParameterError::InvalidType {
        arg: arg.to_string(),
        expected: "positive integer".to_string(),
    };
    let count = match params.get(arg) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(value)) => value.as_u64().ok_or_else(invalid_type)?,
        Some(Value::String(value)) => value.trim().parse::<u64>().map_err(|_| invalid_type())?,
        Some(_) => return Err(invalid_type()),
    };
    if count == 0 {
        return Err(invalid_type());
    }
    usize::try_from(count).map(Some).map_err(|_| invalid_type())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackPostParams {
    pub channel: String,
    pub text: String,
}

impl SlackPostParams {
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, ParameterError> {
        Ok(Self {
            channel: required_string(params, "channel")?,
            text: required_string(params, "text")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraCreateParams {
    pub summary: String,
    pub description: String,
    pub project_key: Option<String>,
}

impl JiraCreateParams {
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, ParameterError> {
        Ok(Self {
            summary: required_string(params, "summary")?,
            description: required_string(params, "description")?,
            project_key: optional_string(params, "project_key")?
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReadParams {
    pub folder: Option<String>,
    pub limit: Option<usize>,
}

impl EmailReadParams {
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, ParameterError> {
        let folder = optional_string(params, "folder")?
            .map(|folder| folder.trim().to_string())
            .filter(|folder| !folder.is_empty());
        if let Some(folder) = folder.as_ref() {
            if folder.contains('/') || folder.contains('\\') || folder == "." || folder == ".." {
                return Err(ParameterError::InvalidValue {
                    arg: "folder".to_string(),
                    reason: "folder must be a single mailbox folder name".to_string(),
                });
            }
        }
        Ok(Self {
            folder,
            limit: optional_count(params, "limit")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCreateParams {
    pub title: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl CalendarCreateParams {
    pub const DEFAULT_TITLE: &'static str = "Meeting";

    pub fn from_params(params: &Map<String, Value>) -> Result<Self, ParameterError> {
        Ok(Self {
            title: optional_string(params, "title")?
                .unwrap_or_else(|| Self::DEFAULT_TITLE.to_string()),
            start_time: optional_string(params, "start_time")?,
            end_time: optional_string(params, "end_time")?,
        })
    }
}
