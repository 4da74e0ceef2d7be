use super::collaborators::{Planner, Responder, NO_MEMORY_CONTEXT};
use super::error::EngineError;
use super::normalize::ParameterNormalizer;
use super::plan::plan_or_fallback;
use super::state::{RunState, WorkflowPhase};
use super::step_execution::{StepExecutor, StepOutcome};
use crate::memory::{MemoryStore, NullMemoryStore};
use crate::shared::ids::generate_run_id;
use crate::shared::logging::{EngineLog, LogLevel};
use crate::tools::ToolRegistry;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEFAULT_RECALL_LIMIT: usize = 3;

/// Shared stop flag. The controller checks it before each step; a step that
/// has started always finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub state: RunState,
    pub response: String,
    pub phases: Vec<WorkflowPhase>,
    pub outcomes: Vec<StepOutcome>,
}

struct PhaseTracker<'a> {
    current: WorkflowPhase,
    visited: Vec<WorkflowPhase>,
    log: &'a EngineLog,
}

impl<'a> PhaseTracker<'a> {
    fn start(log: &'a EngineLog) -> Self {
        Self {
            current: WorkflowPhase::Planning,
            visited: vec![WorkflowPhase::Planning],
            log,
        }
    }

    fn advance(&mut self, next: WorkflowPhase) -> Result<(), EngineError> {
        if !self.current.can_transition_to(next) {
            return Err(EngineError::InvalidPhaseTransition {
                from: self.current,
                to: next,
            });
        }
        self.log.record(
            LogLevel::Debug,
            "run.phase",
            &format!("{} -> {}", self.current, next),
            &[
                ("from", Value::String(self.current.to_string())),
                ("to", Value::String(next.to_string())),
            ],
        );
        self.current = next;
        self.visited.push(next);
        Ok(())
    }
}

/// Drives one request through Planning, Executing, Responding and Done.
/// Holds no per-run state, so one controller can serve many runs.
pub struct WorkflowController {
    planner: Arc<dyn Planner>,
    responder: Arc<dyn Responder>,
    memory: Arc<dyn MemoryStore>,
    executor: StepExecutor,
    recall_limit: usize,
    log: EngineLog,
}

impl WorkflowController {
    pub fn new(
        registry: Arc<ToolRegistry>,
        planner: Arc<dyn Planner>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            planner,
            responder,
            memory: Arc::new(NullMemoryStore),
            executor: StepExecutor::new(registry, ParameterNormalizer::default()),
            recall_limit: DEFAULT_RECALL_LIMIT,
            log: EngineLog::disabled(),
        }
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>, recall_limit: usize) -> Self {
        self.memory = memory;
        self.recall_limit = recall_limit;
        self
    }

    pub fn with_normalizer(mut self, normalizer: ParameterNormalizer) -> Self {
        self.executor = StepExecutor::new(self.executor.shared_registry(), normalizer);
        self
    }

    pub fn with_log(mut self, log: EngineLog) -> Self {
        self.log = log;
        self
    }

    pub fn executor(&self) -> &StepExecutor {
        &self.executor
    }

    pub fn run(&self, user_input: &str) -> Result<RunReport, EngineError> {
        self.run_with_cancel(user_input, &CancelHandle::new())
    }

    pub fn run_with_cancel(
        &self,
        user_input: &str,
        cancel: &CancelHandle,
    ) -> Result<RunReport, EngineError> {
        let run_id =
            generate_run_id(chrono::Utc::now().timestamp()).map_err(EngineError::RunId)?;
        let log = self.log.with_run_id(&run_id);
        log.record(
            LogLevel::Info,
            "run.started",
            "Starting run",
            &[("input", Value::String(user_input.to_string()))],
        );

        let result = self.drive(&run_id, user_input, cancel, &log);
        match &result {
            Ok(report) => log.record(
                LogLevel::Info,
                "run.completed",
                "Run completed",
                &[("steps", Value::from(report.state.cursor()))],
            ),
            Err(err) => log.error("run.failed", &err.to_string()),
        }
        result
    }

    fn recall_context(&self, user_input: &str, log: &EngineLog) -> String {
        match self.memory.recall(user_input, self.recall_limit) {
            Ok(entries) if !entries.is_empty() => entries.join("\n"),
            Ok(_) => NO_MEMORY_CONTEXT.to_string(),
            Err(err) => {
                log.warn("memory.recall_failed", &format!("Memory store not available: {err}"));
                NO_MEMORY_CONTEXT.to_string()
            }
        }
    }

    fn drive(
        &self,
        run_id: &str,
        user_input: &str,
        cancel: &CancelHandle,
        log: &EngineLog,
    ) -> Result<RunReport, EngineError> {
        let mut phases = PhaseTracker::start(log);

        let memory_context = self.recall_context(user_input, log);
        let raw_plan = self
            .planner
            .plan(user_input, &memory_context)
            .map_err(EngineError::Planner)?;
        let (plan, format_error) = plan_or_fallback(&raw_plan, user_input);
        if let Some(err) = format_error {
            log.warn("plan.fallback", &format!("Using default plan: {err}"));
        }
        log.record(
            LogLevel::Info,
            "plan.ready",
            &format!("Plan has {} step(s)", plan.len()),
            &[(
                "tools",
                Value::from(
                    plan.steps()
                        .iter()
                        .map(|step| step.tool.clone())
                        .collect::<Vec<_>>(),
                ),
            )],
        );

        let mut state = RunState::new(user_input, plan);
        let mut outcomes = Vec::with_capacity(state.plan().len());
        phases.advance(WorkflowPhase::Executing)?;
        while !state.is_complete() {
            if cancel.is_canceled() {
                return Err(EngineError::Canceled {
                    completed: state.cursor(),
                    total: state.plan().len(),
                });
            }
            outcomes.push(self.executor.execute_step(&mut state, log)?);
            if !state.is_complete() {
                phases.advance(WorkflowPhase::Executing)?;
            }
        }
        state.check_invariants()?;

        phases.advance(WorkflowPhase::Responding)?;
        let response = self
            .responder
            .respond(state.user_input(), state.history())
            .map_err(EngineError::Responder)?;

        let history = serde_json::to_string(state.history()).unwrap_or_default();
        if let Err(err) = self.memory.remember(&format!("User action: {history}")) {
            log.warn("memory.remember_failed", &format!("Memory store not available: {err}"));
        }

        phases.advance(WorkflowPhase::Done)?;
        Ok(RunReport {
            run_id: run_id.to_string(),
            state,
            response,
            phases: phases.visited,
            outcomes,
        })
    }
}
