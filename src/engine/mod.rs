//! Plan execution engine: plan parsing, parameter normalization, the step
//! executor, and the workflow controller that sequences a run.

pub mod collaborators;
pub mod error;
pub mod normalize;
pub mod plan;
pub mod state;
pub mod step_execution;
pub mod workflow;

pub use collaborators::{
    render_planner_prompt, render_responder_prompt, render_tool_catalog, LlmPlanner,
    LlmResponder, Planner, Responder, NO_MEMORY_CONTEXT,
};
pub use error::EngineError;
pub use normalize::ParameterNormalizer;
pub use plan::{parse_plan, plan_or_fallback, strip_code_fences, Plan, PlanFormatError, Step};
pub use state::{history_entry, RunState, WorkflowPhase};
pub use step_execution::{
    execution_error_message, parameter_error_message, tool_not_found_message, StepExecutor,
    StepOutcome,
};
pub use workflow::{CancelHandle, RunReport, WorkflowController, DEFAULT_RECALL_LIMIT};
