use super::error::EngineError;
use super::normalize::ParameterNormalizer;
use super::state::RunState;
use crate::shared::logging::{EngineLog, LogLevel};
use crate::tools::params::reject_unexpected;
use crate::tools::{ToolError, ToolRegistry};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub tool: String,
    pub result: String,
    pub succeeded: bool,
    pub next_cursor: usize,
}

pub fn tool_not_found_message(tool: &str) -> String {
    format!("Tool not found: {tool}")
}

pub fn parameter_error_message(tool: &str, detail: &str, params: &Map<String, Value>) -> String {
    format!(
        "Parameter error for {tool}: {detail}. Got params: {}",
        Value::Object(params.clone())
    )
}

pub fn execution_error_message(tool: &str, detail: &str) -> String {
    format!("Error executing {tool}: {detail}")
}

/// Runs one pending step: resolve, normalize, invoke, record. Tool failures
/// are folded into the recorded result; only a broken run state is an error.
#[derive(Clone)]
pub struct StepExecutor {
    registry: Arc<ToolRegistry>,
    normalizer: ParameterNormalizer,
}

impl StepExecutor {
    pub fn new(registry: Arc<ToolRegistry>, normalizer: ParameterNormalizer) -> Self {
        Self {
            registry,
            normalizer,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn normalizer(&self) -> &ParameterNormalizer {
        &self.normalizer
    }

    pub fn execute_step(
        &self,
        state: &mut RunState,
        log: &EngineLog,
    ) -> Result<StepOutcome, EngineError> {
        let step = state.current_step()?.clone();
        let step_index = state.cursor();
        log.record(
            LogLevel::Info,
            "step.started",
            &format!("Executing tool: {}", step.tool),
            &[
                ("tool", Value::String(step.tool.clone())),
                ("step", Value::from(step_index)),
            ],
        );

        let (result, succeeded) = match self.registry.resolve(&step.tool) {
            Err(_) => (tool_not_found_message(&step.tool), false),
            Ok(descriptor) => {
                let params = self.normalizer.normalize(&step.tool, &step.params);
                let invoked = reject_unexpected(&params, &descriptor.accepts)
                    .map_err(ToolError::from)
                    .and_then(|()| descriptor.capability.invoke(&params));
                match invoked {
                    Ok(text) => (text, true),
                    Err(ToolError::Parameter(err)) => (
                        parameter_error_message(&step.tool, &err.to_string(), &params),
                        false,
                    ),
                    Err(err) => (execution_error_message(&step.tool, &err.to_string()), false),
                }
            }
        };

        state.record_step(&step.tool, result.clone());
        state.check_invariants()?;

        log.record(
            if succeeded {
                LogLevel::Info
            } else {
                LogLevel::Warn
            },
            if succeeded {
                "step.completed"
            } else {
                "step.failed"
            },
            &result,
            &[
                ("tool", Value::String(step.tool.clone())),
                ("step", Value::from(step_index)),
                ("succeeded", Value::Bool(succeeded)),
            ],
        );

        Ok(StepOutcome {
            tool: step.tool,
            result,
            succeeded,
            next_cursor: state.cursor(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_error_message_embeds_normalized_params() {
        let mut params = Map::new();
        params.insert("channel".to_string(), Value::String("ops".to_string()));
        assert_eq!(
            parameter_error_message("slack.post", "missing required argument `text`", &params),
            "Parameter error for slack.post: missing required argument `text`. Got params: {\"channel\":\"ops\"}"
        );
    }
}
