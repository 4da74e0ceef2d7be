use crate::app::boundary::{
    handle_request, handle_request_json, health_payload, RunRequest, RunResponse, RunStatus,
};
use crate::app::cli::{help_text, parse_cli_verb, split_global_options, CliVerb};
use crate::app::wiring::build_engine_runtime;
use crate::config::{load_settings, Settings};
use crate::engine::WorkflowController;
use crate::tools::ToolRegistry;
use std::path::Path;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let (options, args) = split_global_options(&args)?;
    if args.is_empty() {
        return Ok(help_text());
    }

    let load = || {
        load_settings(options.config_path.as_deref().map(Path::new)).map_err(|e| e.to_string())
    };
    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Help => Ok(help_text()),
        CliVerb::Health => cmd_health(),
        CliVerb::Tools => cmd_tools(load()?),
        CliVerb::Run => cmd_run(load()?, &args[1..]),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}

pub fn cmd_health() -> Result<String, String> {
    serde_json::to_string(&health_payload()).map_err(|e| e.to_string())
}

pub fn render_tool_listing(registry: &ToolRegistry) -> String {
    let mut lines = Vec::with_capacity(registry.len());
    for descriptor in registry.descriptors() {
        let accepts = descriptor
            .accepts
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "{:<16} {} [{}]",
            descriptor.name, descriptor.summary, accepts
        ));
    }
    lines.join("\n")
}

pub fn cmd_tools(settings: Settings) -> Result<String, String> {
    let runtime = build_engine_runtime(settings).map_err(|e| e.to_string())?;
    Ok(render_tool_listing(&runtime.registry))
}

/// Parses `run` arguments into a response. `--json` takes a request object;
/// anything else is joined into the task text.
pub fn run_command(controller: &WorkflowController, args: &[String]) -> RunResponse {
    match args.first().map(String::as_str) {
        Some("--json") => match args.get(1) {
            Some(raw) if args.len() == 2 => handle_request_json(controller, raw),
            Some(_) => RunResponse::error("`run --json` takes exactly one request argument"),
            None => RunResponse::error("`run --json` requires a request object"),
        },
        _ => handle_request(controller, &RunRequest::from_task(&args.join(" "))),
    }
}

pub fn cmd_run(settings: Settings, args: &[String]) -> Result<String, String> {
    let runtime = build_engine_runtime(settings).map_err(|e| e.to_string())?;
    let response = run_command(&runtime.controller, args);
    let rendered = serde_json::to_string_pretty(&response.to_value()).map_err(|e| e.to_string())?;
    match response.status {
        RunStatus::Success => Ok(rendered),
        RunStatus::Error => Err(rendered),
    }
}
