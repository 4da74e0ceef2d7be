use serde_json::{json, Map, Value};
use taskpilot::config::AgentChannel;
use taskpilot::engine::ParameterNormalizer;
use taskpilot::tools::ToolName;

fn map(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object")
}

#[test]
fn engine_normalize_module_slack_examples() {
    let normalizer = ParameterNormalizer::default();
    assert_eq!(
        normalizer.normalize("slack.post", &map(json!({"message": "hi"}))),
        map(json!({"text": "hi", "channel": "agent_channal"}))
    );
    assert_eq!(
        normalizer.normalize("slack.post", &map(json!({"text": "hi", "channel": "#general"}))),
        map(json!({"text": "hi", "channel": "agent_channal"}))
    );
    assert_eq!(
        normalizer.normalize("slack.post", &map(json!({"text": "hi", "channel": "#ops"}))),
        map(json!({"text": "hi", "channel": "ops"}))
    );
    assert_eq!(
        normalizer.normalize("slack.post", &map(json!({"text": "hi", "channel": ""}))),
        map(json!({"text": "hi", "channel": "agent_channal"}))
    );
}

#[test]
fn engine_normalize_module_jira_project_alias() {
    let normalizer = ParameterNormalizer::default();
    assert_eq!(
        normalizer.normalize(
            "jira.create",
            &map(json!({"project": "KAN", "summary": "s", "description": "d"}))
        ),
        map(json!({"project_key": "KAN", "summary": "s", "description": "d"}))
    );
}

#[test]
fn engine_normalize_module_uses_configured_agent_channel() {
    let normalizer = ParameterNormalizer::new(AgentChannel::parse("ops-bots").expect("channel"));
    assert_eq!(
        normalizer.normalize("slack.post", &map(json!({"text": "hi", "channel": "general"}))),
        map(json!({"text": "hi", "channel": "ops-bots"}))
    );
    assert_eq!(
        normalizer.normalize("slack.post", &map(json!({"text": "hi", "channel": null}))),
        map(json!({"text": "hi", "channel": "ops-bots"}))
    );
}

#[test]
fn engine_normalize_module_is_idempotent_for_every_tool() {
    let inputs = [
        json!({}),
        json!({"message": "hi"}),
        json!({"message": "a", "text": "b"}),
        json!({"text": "hi", "channel": "#general"}),
        json!({"text": "hi", "channel": "##  #general "}),
        json!({"text": "hi", "channel": "# #x"}),
        json!({"text": "hi", "channel": ["ops"]}),
        json!({"text": "hi", "channel": "  "}),
        json!({"project": "KAN", "summary": "s", "description": "d"}),
        json!({"project": "A", "project_key": "B"}),
        json!({"folder": "inbox", "limit": 3}),
        json!({"title": "Sync", "start_time": "2025-01-01T10:00:00Z"}),
    ];
    let normalizers = [
        ParameterNormalizer::default(),
        ParameterNormalizer::new(AgentChannel::parse("alerts").expect("channel")),
    ];
    let tools: Vec<&str> = ToolName::ALL
        .iter()
        .map(|tool| tool.as_str())
        .chain(["bogus.tool"])
        .collect();

    for normalizer in &normalizers {
        for tool in &tools {
            for input in &inputs {
                let once = normalizer.normalize(tool, &map(input.clone()));
                let twice = normalizer.normalize(tool, &once);
                assert_eq!(once, twice, "tool {tool} input {input}");
            }
        }
    }
}

#[test]
fn engine_normalize_module_does_not_mutate_the_input() {
    let normalizer = ParameterNormalizer::default();
    let params = map(json!({"message": "hi", "channel": "#general"}));
    let before = params.clone();
    let _ = normalizer.normalize("slack.post", &params);
    assert_eq!(params, before);
}

#[test]
fn engine_normalize_module_channel_keeps_everything_after_leading_hashes() {
    let normalizer = ParameterNormalizer::default();
    let cases = [
        (" ops ", " ops "),
        ("# general", " general"),
        ("#ops#", "ops#"),
        ("##general", "agent_channal"),
    ];
    for (raw, expected) in cases {
        assert_eq!(
            normalizer.normalize("slack.post", &map(json!({"text": "hi", "channel": raw}))),
            map(json!({"text": "hi", "channel": expected})),
            "channel {raw:?}"
        );
    }
}
