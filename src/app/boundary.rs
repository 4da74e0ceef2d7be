use crate::engine::{RunState, WorkflowController};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const SERVICE_NAME: &str = "taskpilot";
pub const SUCCESS_MESSAGE: &str = "Task completed successfully";

/// Inbound request. `task` wins over `input` when both are present and
/// non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

impl RunRequest {
    pub fn from_task(task: &str) -> Self {
        Self {
            task: Some(task.to_string()),
            input: None,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| format!("invalid run request json: {e}"))
    }

    pub fn user_input(&self) -> Result<&str, String> {
        [self.task.as_deref(), self.input.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
            .ok_or_else(|| "request must include a non-empty `task` or `input`".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub state: RunState,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResponse {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RunResult>,
    pub message: String,
}

impl RunResponse {
    pub fn success(result: RunResult) -> Self {
        Self {
            status: RunStatus::Success,
            result: Some(result),
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            result: None,
            message: message.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self)
            .unwrap_or_else(|e| json!({ "status": "error", "message": e.to_string() }))
    }
}

pub fn handle_request(controller: &WorkflowController, request: &RunRequest) -> RunResponse {
    let user_input = match request.user_input() {
        Ok(user_input) => user_input,
        Err(err) => return RunResponse::error(err),
    };
    match controller.run(user_input) {
        Ok(report) => RunResponse::success(RunResult {
            state: report.state,
            response: report.response,
        }),
        Err(err) => RunResponse::error(err.to_string()),
    }
}

pub fn handle_request_json(controller: &WorkflowController, raw: &str) -> RunResponse {
    match RunRequest::parse(raw) {
        Ok(request) => handle_request(controller, &request),
        Err(err) => RunResponse::error(err),
    }
}

pub fn health_payload() -> Value {
    json!({ "status": "healthy", "service": SERVICE_NAME })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_wins_over_input_unless_blank() {
        let request = RunRequest {
            task: Some("from task".to_string()),
            input: Some("from input".to_string()),
        };
        assert_eq!(request.user_input(), Ok("from task"));

        let request = RunRequest {
            task: Some("  ".to_string()),
            input: Some("from input".to_string()),
        };
        assert_eq!(request.user_input(), Ok("from input"));

        assert!(RunRequest::default().user_input().is_err());
    }

    #[test]
    fn error_response_omits_result() {
        let value = RunResponse::error("planner failed: boom").to_value();
        assert_eq!(
            value,
            json!({ "status": "error", "message": "planner failed: boom" })
        );
    }
}
