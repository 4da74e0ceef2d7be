use super::error::EngineError;
use super::plan::{Plan, Step};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Planning,
    Executing,
    Responding,
    Done,
}

impl WorkflowPhase {
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (WorkflowPhase::Planning, WorkflowPhase::Executing)
                | (WorkflowPhase::Executing, WorkflowPhase::Executing)
                | (WorkflowPhase::Executing, WorkflowPhase::Responding)
                | (WorkflowPhase::Responding, WorkflowPhase::Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowPhase::Done)
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowPhase::Planning => write!(f, "planning"),
            WorkflowPhase::Executing => write!(f, "executing"),
            WorkflowPhase::Responding => write!(f, "responding"),
            WorkflowPhase::Done => write!(f, "done"),
        }
    }
}

pub fn history_entry(tool: &str, result: &str) -> String {
    format!("{tool} → {result}")
}

/// Per-run working state. Only the step executor advances it, one step at a
/// time, so `history.len() == cursor` holds between steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    user_input: String,
    plan: Plan,
    cursor: usize,
    last_result: Option<String>,
    history: Vec<String>,
}

impl RunState {
    pub fn new(user_input: &str, plan: Plan) -> Self {
        Self {
            user_input: user_input.to_string(),
            plan,
            cursor: 0,
            last_result: None,
            history: Vec::new(),
        }
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last_result(&self) -> Option<&str> {
        self.last_result.as_deref()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.plan.len()
    }

    pub fn remaining(&self) -> usize {
        self.plan.len().saturating_sub(self.cursor)
    }

    pub fn check_invariants(&self) -> Result<(), EngineError> {
        if self.cursor > self.plan.len() {
            return Err(EngineError::InvariantViolation(format!(
                "cursor {} is past the end of a {}-step plan",
                self.cursor,
                self.plan.len()
            )));
        }
        if self.history.len() != self.cursor {
            return Err(EngineError::InvariantViolation(format!(
                "history has {} entries but cursor is {}",
                self.history.len(),
                self.cursor
            )));
        }
        Ok(())
    }

    pub fn current_step(&self) -> Result<&Step, EngineError> {
        self.check_invariants()?;
        self.plan.get(self.cursor).ok_or_else(|| {
            EngineError::InvariantViolation(format!(
                "no pending step: cursor {} of {}",
                self.cursor,
                self.plan.len()
            ))
        })
    }

    pub(crate) fn record_step(&mut self, tool: &str, result: String) {
        self.history.push(history_entry(tool, &result));
        self.last_result = Some(result);
        self.cursor += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn legal_phase_transitions_form_a_single_path() {
        use WorkflowPhase::*;
        let all = [Planning, Executing, Responding, Done];
        let legal: Vec<(WorkflowPhase, WorkflowPhase)> = all
            .iter()
            .flat_map(|from| all.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();
        assert_eq!(
            legal,
            vec![
                (Planning, Executing),
                (Executing, Executing),
                (Executing, Responding),
                (Responding, Done),
            ]
        );
        assert!(Done.is_terminal());
        assert!(!Responding.is_terminal());
    }

    #[test]
    fn recording_a_step_keeps_history_in_step_with_cursor() {
        let plan = Plan::new(vec![Step::new("email.read", Map::new())]);
        let mut state = RunState::new("check mail", plan);
        assert_eq!(state.current_step().expect("pending").tool, "email.read");

        state.record_step("email.read", "No messages in inbox".to_string());
        assert_eq!(state.cursor(), 1);
        assert_eq!(state.history(), ["email.read → No messages in inbox"]);
        assert_eq!(state.last_result(), Some("No messages in inbox"));
        assert!(state.is_complete());
        state.check_invariants().expect("consistent");
        assert!(matches!(
            state.current_step(),
            Err(EngineError::InvariantViolation(_))
        ));
    }
}
