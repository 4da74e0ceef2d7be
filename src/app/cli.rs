#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Run,
    Tools,
    Health,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "run" => CliVerb::Run,
        "tools" => CliVerb::Tools,
        "health" => CliVerb::Health,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Usage: taskpilot [--config <path>] <command>".to_string(),
        String::new(),
        "Commands:".to_string(),
        "  run <task...>                        Plan, execute and answer a task".to_string(),
        "  run --json '<request>'               Run a {\"task\"} or {\"input\"} request object"
            .to_string(),
        "  tools                                List registered tools and their parameters"
            .to_string(),
        "  health                               Print the service health payload".to_string(),
        "  help                                 Show this help".to_string(),
    ]
}

pub fn help_text() -> String {
    cli_help_lines().join("\n")
}

/// Global options that precede the command verb.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    pub config_path: Option<String>,
}

pub fn split_global_options(args: &[String]) -> Result<(GlobalOptions, Vec<String>), String> {
    let mut options = GlobalOptions::default();
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if !rest.is_empty() {
            rest.push(arg.clone());
            continue;
        }
        if arg == "--config" {
            let path = iter
                .next()
                .ok_or_else(|| "`--config` requires a path".to_string())?;
            options.config_path = Some(path.clone());
        } else if let Some(path) = arg.strip_prefix("--config=") {
            options.config_path = Some(path.to_string());
        } else {
            rest.push(arg.clone());
        }
    }
    Ok((options, rest))
}
