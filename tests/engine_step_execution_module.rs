use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use taskpilot::config::SlackConfig;
use taskpilot::engine::{ParameterNormalizer, Plan, RunState, Step, StepExecutor};
use taskpilot::shared::logging::EngineLog;
use taskpilot::tools::{
    CalendarStore, Capability, CapabilityError, SlackPoster, ToolDescriptor, ToolError, ToolName,
    ToolRegistry,
};
use tempfile::tempdir;

struct Rejecting;

impl Capability for Rejecting {
    fn invoke(&self, _params: &Map<String, Value>) -> Result<String, ToolError> {
        Err(CapabilityError::Rejected("Slack API error: channel_not_found".to_string()).into())
    }
}

fn step(tool: &str, params: Value) -> Step {
    Step::new(tool, params.as_object().cloned().unwrap_or_default())
}

fn executor(registry: ToolRegistry) -> StepExecutor {
    StepExecutor::new(Arc::new(registry), ParameterNormalizer::default())
}

fn offline_slack() -> Arc<SlackPoster> {
    Arc::new(SlackPoster::new(
        &SlackConfig::default(),
        Duration::from_secs(1),
        EngineLog::disabled(),
    ))
}

#[test]
fn engine_step_execution_module_unknown_tool_advances_cursor() {
    let executor = executor(ToolRegistry::new());
    let mut state = RunState::new("x", Plan::new(vec![step("bogus.tool", json!({}))]));

    let outcome = executor
        .execute_step(&mut state, &EngineLog::disabled())
        .expect("step");
    assert_eq!(outcome.result, "Tool not found: bogus.tool");
    assert!(!outcome.succeeded);
    assert_eq!(outcome.next_cursor, 1);
    assert_eq!(state.history(), ["bogus.tool → Tool not found: bogus.tool"]);
}

#[test]
fn engine_step_execution_module_unexpected_argument_reports_normalized_params() {
    let executor = executor(
        ToolRegistry::new().with(ToolDescriptor::builtin(ToolName::SlackPost, offline_slack())),
    );
    let mut state = RunState::new(
        "x",
        Plan::new(vec![step(
            "slack.post",
            json!({"message": "hi", "channel": "#general", "urgent": true}),
        )]),
    );

    let outcome = executor
        .execute_step(&mut state, &EngineLog::disabled())
        .expect("step");
    assert_eq!(
        outcome.result,
        "Parameter error for slack.post: unexpected argument `urgent`. Got params: {\"channel\":\"agent_channal\",\"text\":\"hi\",\"urgent\":true}"
    );
}

#[test]
fn engine_step_execution_module_missing_argument_is_a_parameter_error() {
    let executor = executor(
        ToolRegistry::new().with(ToolDescriptor::builtin(ToolName::SlackPost, offline_slack())),
    );
    let mut state = RunState::new("x", Plan::new(vec![step("slack.post", json!({}))]));
    let outcome = executor
        .execute_step(&mut state, &EngineLog::disabled())
        .expect("step");
    assert_eq!(
        outcome.result,
        "Parameter error for slack.post: missing required argument `text`. Got params: {\"channel\":\"agent_channal\"}"
    );
}

#[test]
fn engine_step_execution_module_capability_failures_become_history() {
    let executor = executor(
        ToolRegistry::new()
            .with(ToolDescriptor::builtin(ToolName::SlackPost, offline_slack()))
            .with(ToolDescriptor::builtin(ToolName::JiraCreate, Arc::new(Rejecting))),
    );
    let mut state = RunState::new(
        "x",
        Plan::new(vec![
            step("slack.post", json!({"text": "hi"})),
            step("jira.create", json!({"summary": "s", "description": "d"})),
        ]),
    );
    let log = EngineLog::disabled();
    executor.execute_step(&mut state, &log).expect("first");
    executor.execute_step(&mut state, &log).expect("second");

    assert_eq!(
        state.history(),
        [
            "slack.post → Error executing slack.post: Slack bot token not configured",
            "jira.create → Error executing jira.create: Slack API error: channel_not_found",
        ]
    );
    assert_eq!(state.cursor(), 2);
}

#[test]
fn engine_step_execution_module_calendar_step_writes_event() {
    let temp = tempdir().expect("tempdir");
    let calendar = CalendarStore::new(
        temp.path().join("calendar/events.jsonl"),
        "UTC",
        EngineLog::disabled(),
    )
    .expect("calendar");
    let executor = executor(
        ToolRegistry::new().with(ToolDescriptor::builtin(
            ToolName::CalendarCreate,
            Arc::new(calendar),
        )),
    );
    let mut state = RunState::new(
        "x",
        Plan::new(vec![
            step("calendar.create", json!({"title": "Retro"})),
            step(
                "calendar.create",
                json!({"start_time": "2025-03-01T10:00", "end_time": "2025-03-01T09:00"}),
            ),
        ]),
    );
    let log = EngineLog::disabled();
    let first = executor.execute_step(&mut state, &log).expect("first");
    let second = executor.execute_step(&mut state, &log).expect("second");

    assert_eq!(first.result, "Calendar event created: Retro");
    assert!(first.succeeded);
    assert!(second
        .result
        .starts_with("Parameter error for calendar.create: invalid value for `end_time`"));
    assert!(temp.path().join("calendar/events.jsonl").is_file());
}

#[test]
fn engine_step_execution_module_refuses_to_run_past_the_plan() {
    let executor = executor(ToolRegistry::new());
    let mut state = RunState::new("x", Plan::default());
    assert!(executor
        .execute_step(&mut state, &EngineLog::disabled())
        .is_err());
    assert_eq!(state.cursor(), 0);
}
