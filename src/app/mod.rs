pub mod boundary;
pub mod cli;
pub mod command_handlers;
pub mod wiring;

pub use boundary::{
    handle_request, handle_request_json, health_payload, RunRequest, RunResponse, RunResult,
    RunStatus,
};
pub use command_handlers::run_cli;
pub use wiring::{build_engine_runtime, EngineRuntime};
