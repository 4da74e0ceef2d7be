use crate::config::AgentChannel;
use crate::llm::{ChatModel, LlmError};
use crate::tools::ToolRegistry;
use std::sync::Arc;

pub const NO_MEMORY_CONTEXT: &str = "No previous context available";

/// Produces raw plan text for a request. Parsing the text is the engine's
/// job.
pub trait Planner: Send + Sync {
    fn plan(&self, user_input: &str, memory_context: &str) -> Result<String, LlmError>;
}

/// Turns the executed history into the final reply for the user.
pub trait Responder: Send + Sync {
    fn respond(&self, user_input: &str, history: &[String]) -> Result<String, LlmError>;
}

/// One line per registered tool, e.g. `- "slack.post": channel, text`.
pub fn render_tool_catalog(registry: &ToolRegistry) -> String {
    registry
        .descriptors()
        .map(|descriptor| {
            let accepts = descriptor
                .accepts
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "- \"{}\" ({}): {}",
                descriptor.name, descriptor.summary, accepts
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_planner_prompt(
    tool_catalog: &str,
    agent_channel: &AgentChannel,
    memory_context: &str,
    user_input: &str,
) -> String {
    format!(
        "You are a workflow planner. Create a plan to complete the user's request.\n\
\n\
Rules:\n\
1. Output ONLY valid JSON, with no markdown and no explanations.\n\
2. Return a JSON array of steps.\n\
3. Each step must have \"tool\" (string) and \"params\" (object).\n\
4. Use only the tools and parameter names listed below.\n\
\n\
Allowed tools and their parameters:\n\
{tool_catalog}\n\
\n\
Example response:\n\
[{{\"tool\": \"slack.post\", \"params\": {{\"channel\": \"{agent_channel}\", \"text\": \"Hello\"}}}}]\n\
\n\
Always use channel \"{agent_channel}\" for Slack messages. Never use \"#general\".\n\
\n\
Relevant context from earlier requests:\n\
{memory_context}\n\
\n\
User request:\n\
{user_input}\n\
\n\
Response (JSON array only):\n"
    )
}

pub fn render_responder_prompt(user_input: &str, history: &[String]) -> String {
    format!(
        "You are a helpful assistant reporting on actions taken for the user.\n\
\n\
User request:\n\
{user_input}\n\
\n\
Actions taken:\n\
{}\n\
\n\
Provide a helpful response:\n",
        history.join("\n")
    )
}

pub struct LlmPlanner {
    model: Arc<dyn ChatModel>,
    tool_catalog: String,
    agent_channel: AgentChannel,
}

impl LlmPlanner {
    pub fn new(
        model: Arc<dyn ChatModel>,
        registry: &ToolRegistry,
        agent_channel: AgentChannel,
    ) -> Self {
        Self {
            model,
            tool_catalog: render_tool_catalog(registry),
            agent_channel,
        }
    }
}

impl Planner for LlmPlanner {
    fn plan(&self, user_input: &str, memory_context: &str) -> Result<String, LlmError> {
        let prompt = render_planner_prompt(
            &self.tool_catalog,
            &self.agent_channel,
            memory_context,
            user_input,
        );
        self.model.complete(&prompt)
    }
}

pub struct LlmResponder {
    model: Arc<dyn ChatModel>,
}

impl LlmResponder {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

impl Responder for LlmResponder {
    fn respond(&self, user_input: &str, history: &[String]) -> Result<String, LlmError> {
        self.model
            .complete(&render_responder_prompt(user_input, history))
    }
}
