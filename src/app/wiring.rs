use crate::config::{ConfigError, Settings};
use crate::engine::{LlmPlanner, LlmResponder, ParameterNormalizer, WorkflowController};
use crate::llm::{ChatModel, OpenAiCompatibleClient};
use crate::memory::{MemoryStore, NullMemoryStore, SqliteMemoryStore};
use crate::shared::logging::{engine_log_path, EngineLog};
use crate::tools::{build_default_registry, ToolRegistry};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Everything a host needs to serve runs, built once from settings.
pub struct EngineRuntime {
    pub settings: Settings,
    pub log: EngineLog,
    pub registry: Arc<ToolRegistry>,
    pub controller: WorkflowController,
}

pub fn build_engine_log(settings: &Settings) -> Result<EngineLog, ConfigError> {
    let state_root = settings.resolve_state_root()?;
    Ok(EngineLog::to_file(
        engine_log_path(&state_root),
        settings.logging.level,
    ))
}

/// Memory is optional: an unusable database downgrades to no memory.
pub fn build_memory_store(settings: &Settings, log: &EngineLog) -> Arc<dyn MemoryStore> {
    if !settings.memory.enabled {
        return Arc::new(NullMemoryStore);
    }
    let opened = settings
        .resolve_memory_db_path()
        .map_err(|err| err.to_string())
        .and_then(|path| SqliteMemoryStore::open(&path).map_err(|err| err.to_string()));
    match opened {
        Ok(store) => Arc::new(store),
        Err(err) => {
            log.warn("memory.unavailable", &format!("Memory store not available: {err}"));
            Arc::new(NullMemoryStore)
        }
    }
}

pub fn build_engine_runtime(settings: Settings) -> Result<EngineRuntime, ConfigError> {
    let log = build_engine_log(&settings)?;
    let registry = Arc::new(build_default_registry(&settings, &log)?);
    let timeout = Duration::from_secs(settings.http.timeout_seconds);
    let model: Arc<dyn ChatModel> = Arc::new(OpenAiCompatibleClient::new(
        &settings.llm,
        timeout,
        log.clone(),
    ));
    let agent_channel = settings.slack.agent_channel.clone();
    let planner = LlmPlanner::new(Arc::clone(&model), &registry, agent_channel.clone());
    let responder = LlmResponder::new(model);
    let memory = build_memory_store(&settings, &log);

    let controller = WorkflowController::new(
        Arc::clone(&registry),
        Arc::new(planner),
        Arc::new(responder),
    )
    .with_normalizer(ParameterNormalizer::new(agent_channel))
    .with_memory(memory, settings.memory.recall_limit)
    .with_log(log.clone());

    log.record(
        crate::shared::logging::LogLevel::Info,
        "engine.ready",
        "Engine initialized",
        &[
            ("tools", Value::from(registry.len())),
            (
                "model",
                settings
                    .llm
                    .model
                    .clone()
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            ),
        ],
    );

    Ok(EngineRuntime {
        settings,
        log,
        registry,
        controller,
    })
}
