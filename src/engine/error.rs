use super::state::WorkflowPhase;
use crate::llm::LlmError;

/// Run-level failures. Step-level failures never surface here; they become
/// history entries.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("planner failed: {0}")]
    Planner(#[source] LlmError),
    #[error("responder failed: {0}")]
    Responder(#[source] LlmError),
    #[error("workflow phase transition `{from}` -> `{to}` is invalid")]
    InvalidPhaseTransition {
        from: WorkflowPhase,
        to: WorkflowPhase,
    },
    #[error("run state invariant violated: {0}")]
    InvariantViolation(String),
    #[error("run canceled after {completed} of {total} steps")]
    Canceled { completed: usize, total: usize },
    #[error("failed to allocate run id: {0}")]
    RunId(String),
}
