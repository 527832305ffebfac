// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Courier configuration system.

use courier_config::diagnostic::ConfigError;
use courier_config::model::CourierConfig;
use courier_config::{load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
name = "relay-bot"
log_level = "debug"
system_prompt = "Be brief."

[telegram]
bot_token = "123:ABC"
allowed_users = ["alice", "4242"]

[model]
api_key = "sk-test"
base_url = "http://localhost:9999/v1"
model = "gpt-4o"
max_tokens = 1024
request_timeout_secs = 30

[image]
enabled = true
api_key = "fal-key"

[storage]
database_path = "/tmp/courier-test.db"
wal_mode = false

[pipeline]
context_window = 12
max_tool_iterations = 4
lock_timeout_secs = 5
retry_max_attempts = 2
retry_initial_backoff_ms = 10
retry_max_backoff_ms = 20

[admin]
enabled = false
host = "0.0.0.0"
port = 9090
page_size = 25

[scheduler]
enabled = false
max_pending_per_conversation = 5
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.agent.name, "relay-bot");
    assert_eq!(config.agent.system_prompt.as_deref(), Some("Be brief."));
    assert_eq!(config.telegram.allowed_users, vec!["alice", "4242"]);
    assert_eq!(config.model.model, "gpt-4o");
    assert_eq!(config.model.request_timeout_secs, 30);
    assert!(config.image.enabled);
    assert_eq!(config.image.model, "fal-ai/flux/dev");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.pipeline.context_window, 12);
    assert_eq!(config.pipeline.max_tool_iterations, 4);
    assert_eq!(config.pipeline.lock_timeout().as_secs(), 5);
    assert!(!config.admin.enabled);
    assert_eq!(config.admin.port, 9090);
    assert_eq!(config.admin.page_size, 25);
    assert!(!config.scheduler.enabled);
    assert_eq!(config.scheduler.max_pending_per_conversation, 5);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.agent.name, "courier");
    assert_eq!(config.agent.log_level, "info");
    assert!(config.telegram.bot_token.is_none());
    assert!(!config.image.enabled);
    assert!(config.storage.database_path.ends_with("courier.db"));
    assert_eq!(config.pipeline.context_window, 30);
    assert_eq!(config.pipeline.max_tool_iterations, 8);
    assert_eq!(config.admin.page_size, 50);
    assert_eq!(config.admin.host, "127.0.0.1");
    assert!(config.scheduler.enabled);
    assert_eq!(config.scheduler.max_pending_per_conversation, 20);
}

#[test]
fn unknown_key_gets_suggestion_and_valid_keys() {
    let toml = r#"
[pipeline]
context_windw = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. }
            if key == "context_windw"
                && suggestion.as_deref() == Some("context_window")
                && valid_keys.contains("max_tool_iterations"))
    });
    assert!(found, "expected UnknownKey with suggestion, got: {errors:?}");
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = r#"
[logging]
level = "debug"
"#;
    let err = load_config_from_str(toml).expect_err("unknown section should be rejected");
    assert!(err.to_string().contains("logging"), "got: {err}");
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[admin]
port = "eighty"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))),
        "got: {errors:?}"
    );
}

#[test]
fn validation_errors_surface_through_load() {
    let toml = r#"
[pipeline]
max_tool_iterations = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero iterations is invalid");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { field, .. } if field == "pipeline.max_tool_iterations")
    ));
}

#[test]
fn dotted_override_sets_nested_key() {
    use figment::{Figment, providers::Serialized};

    let config: CourierConfig = Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(("telegram.bot_token", "xyz-from-env"))
        .merge(("pipeline.lock_timeout_secs", 7))
        .extract()
        .expect("dotted keys should merge");

    assert_eq!(config.telegram.bot_token.as_deref(), Some("xyz-from-env"));
    assert_eq!(config.pipeline.lock_timeout_secs, 7);
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "naem".to_string(),
        suggestion: Some("name".to_string()),
        valid_keys: "name, log_level".to_string(),
        span: None,
        src: None,
    };

    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `name`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("naem"));
}

#[test]
fn default_config_round_trips_through_toml() {
    let rendered = toml::to_string(&CourierConfig::default()).unwrap();
    let parsed = load_config_from_str(&rendered).unwrap();
    assert_eq!(parsed.agent.name, "courier");
    assert_eq!(parsed.admin.port, CourierConfig::default().admin.port);
    assert_eq!(
        parsed.pipeline.max_tool_iterations,
        CourierConfig::default().pipeline.max_tool_iterations
    );
}
