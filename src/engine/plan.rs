use crate::tools::ToolName;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanFormatError {
    #[error("planner output is not valid json: {0}")]
    Json(String),
    #[error("planner output must be a step array or a single step object, got {0}")]
    UnexpectedShape(&'static str),
    #[error("plan step {index} is malformed: {reason}")]
    MalformedStep { index: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub tool: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Step {
    pub fn new(tool: &str, params: Map<String, Value>) -> Self {
        Self {
            tool: tool.to_string(),
            params,
        }
    }

    fn from_value(index: usize, value: &Value) -> Result<Self, PlanFormatError> {
        let malformed = |reason: &str| PlanFormatError::MalformedStep {
            index,
            reason: reason.to_string(),
        };
        let object = value
            .as_object()
            .ok_or_else(|| malformed("step must be an object"))?;
        let tool = match object.get("tool") {
            Some(Value::String(tool)) if !tool.trim().is_empty() => tool.clone(),
            Some(Value::String(_)) => return Err(malformed("`tool` must be non-empty")),
            Some(_) => return Err(malformed("`tool` must be a string")),
            None => return Err(malformed("missing `tool`")),
        };
        let params = match object.get("params") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(params)) => params.clone(),
            Some(_) => return Err(malformed("`params` must be an object")),
        };
        Ok(Self { tool, params })
    }
}

/// Ordered steps as produced by the planner. The engine never reorders or
/// edits a plan once parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Posts the raw request to the agent channel.
    pub fn fallback(user_input: &str) -> Self {
        let params = json!({ "text": user_input });
        Self::new(vec![Step::new(
            ToolName::SlackPost.as_str(),
            params.as_object().cloned().unwrap_or_default(),
        )])
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Removes a surrounding markdown code fence, with or without a `json` tag.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut content = raw.trim();
    if let Some(rest) = content.strip_prefix("```json") {
        content = rest;
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    content.trim()
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without `tool`",
    }
}

pub fn parse_plan(raw: &str) -> Result<Plan, PlanFormatError> {
    let content = strip_code_fences(raw);
    let value: Value =
        serde_json::from_str(content).map_err(|e| PlanFormatError::Json(e.to_string()))?;
    match &value {
        Value::Array(entries) => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Step::from_value(index, entry))
            .collect::<Result<Vec<_>, _>>()
            .map(Plan::new),
        Value::Object(object) if object.contains_key("tool") => {
            Ok(Plan::new(vec![Step::from_value(0, &value)?]))
        }
        other => Err(PlanFormatError::UnexpectedShape(shape_name(other))),
    }
}

/// Parses planner output, substituting the fallback plan for anything that
/// is not a well-formed plan. The format error is handed back for logging.
pub fn plan_or_fallback(raw: &str, user_input: &str) -> (Plan, Option<PlanFormatError>) {
    match parse_plan(raw) {
        Ok(plan) => (plan, None),
        Err(err) => (Plan::fallback(user_input), Some(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped_with_or_without_language_tag() {
        assert_eq!(strip_code_fences("```json\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  [2] "), "[2]");
    }

    #[test]
    fn single_step_object_is_wrapped() {
        let plan = parse_plan(r#"{"tool":"email.read","params":{"folder":"inbox"}}"#)
            .expect("plan");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps()[0].tool, "email.read");
    }

    #[test]
    fn tool_names_are_kept_verbatim() {
        let plan = parse_plan(r#"[{"tool":" slack.post ","params":{}}]"#).expect("plan");
        assert_eq!(plan.steps()[0].tool, " slack.post ");

        let err = parse_plan(r#"[{"tool":"   "}]"#).expect_err("blank tool");
        assert!(matches!(err, PlanFormatError::MalformedStep { index: 0, .. }));
    }

    #[test]
    fn missing_params_default_to_empty_mapping() {
        let plan = parse_plan(r#"[{"tool":"calendar.create"}]"#).expect("plan");
        assert!(plan.steps()[0].params.is_empty());
    }

    #[test]
    fn malformed_entries_reject_the_whole_plan() {
        let err = parse_plan(r#"[{"tool":"slack.post","params":{}}, {"params":{}}]"#)
            .expect_err("second step has no tool");
        assert_eq!(
            err,
            PlanFormatError::MalformedStep {
                index: 1,
                reason: "missing `tool`".to_string()
            }
        );
    }

    #[test]
    fn other_shapes_fall_back_to_posting_the_request() {
        let (plan, err) = plan_or_fallback(r#"{"steps": []}"#, "ship it");
        assert!(matches!(err, Some(PlanFormatError::UnexpectedShape(_))));
        assert_eq!(plan, Plan::fallback("ship it"));
        assert_eq!(plan.steps()[0].params["text"], "ship it");

        let (_, err) = plan_or_fallback("not json", "ship it");
        assert!(matches!(err, Some(PlanFormatError::Json(_))));
    }
}
