// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::invalid(
            "agent.log_level",
            format!(
                "`{}` is not one of {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::invalid(
            "telegram.bot_token",
            "must not be empty when set",
        ));
    }

    if config.model.model.trim().is_empty() {
        errors.push(ConfigError::invalid("model.model", "must not be empty"));
    }

    if !is_http_url(&config.model.base_url) {
        errors.push(ConfigError::invalid(
            "model.base_url",
            format!("`{}` is not an http(s) URL", config.model.base_url),
        ));
    }

    if config.image.enabled && !is_http_url(&config.image.base_url) {
        errors.push(ConfigError::invalid(
            "image.base_url",
            format!("`{}` is not an http(s) URL", config.image.base_url),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "storage.database_path",
            "must not be empty",
        ));
    }

    let pipeline = &config.pipeline;
    for (field, value) in [
        ("pipeline.context_window", u64::from(pipeline.context_window)),
        (
            "pipeline.max_tool_iterations",
            u64::from(pipeline.max_tool_iterations),
        ),
        ("pipeline.lock_timeout_secs", pipeline.lock_timeout_secs),
        (
            "pipeline.retry_max_attempts",
            u64::from(pipeline.retry_max_attempts),
        ),
    ] {
        if value == 0 {
            errors.push(ConfigError::invalid(field, "must be at least 1"));
        }
    }

    if pipeline.retry_initial_backoff_ms > pipeline.retry_max_backoff_ms {
        errors.push(ConfigError::invalid(
            "pipeline.retry_initial_backoff_ms",
            format!(
                "{} exceeds retry_max_backoff_ms ({})",
                pipeline.retry_initial_backoff_ms, pipeline.retry_max_backoff_ms
            ),
        ));
    }

    if config.admin.page_size == 0 {
        errors.push(ConfigError::invalid("admin.page_size", "must be at least 1"));
    }

    if config.scheduler.max_pending_per_conversation == 0 {
        errors.push(ConfigError::invalid(
            "scheduler.max_pending_per_conversation",
            "must be at least 1",
        ));
    }

    let host = config.admin.host.trim();
    let is_valid_host = host.parse::<std::net::IpAddr>().is_ok()
        || (!host.is_empty()
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-'));
    if !is_valid_host {
        errors.push(ConfigError::invalid(
            "admin.host",
            format!("`{host}` is not a valid IP address or hostname"),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errors: &[ConfigError]) -> Vec<&str> {
        errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::Validation { field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&CourierConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = CourierConfig::default();
        config.storage.database_path = " ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(fields(&errors), vec!["storage.database_path"]);
    }

    #[test]
    fn zero_bounds_are_all_reported() {
        let mut config = CourierConfig::default();
        config.pipeline.max_tool_iterations = 0;
        config.pipeline.lock_timeout_secs = 0;
        config.admin.page_size = 0;
        config.scheduler.max_pending_per_conversation = 0;
        let errors = validate_config(&config).unwrap_err();
        let fields = fields(&errors);
        assert!(fields.contains(&"scheduler.max_pending_per_conversation"));
        assert!(fields.contains(&"pipeline.max_tool_iterations"));
        assert!(fields.contains(&"pipeline.lock_timeout_secs"));
        assert!(fields.contains(&"admin.page_size"));
    }

    #[test]
    fn backoff_order_is_checked() {
        let mut config = CourierConfig::default();
        config.pipeline.retry_initial_backoff_ms = 10_000;
        config.pipeline.retry_max_backoff_ms = 100;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(fields(&errors), vec!["pipeline.retry_initial_backoff_ms"]);
    }

    #[test]
    fn image_url_only_checked_when_enabled() {
        let mut config = CourierConfig::default();
        config.image.base_url = "fal.run".to_string();
        assert!(validate_config(&config).is_ok());

        config.image.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(fields(&errors), vec!["image.base_url"]);
    }

    #[test]
    fn bad_log_level_and_host() {
        let mut config = CourierConfig::default();
        config.agent.log_level = "loud".to_string();
        config.admin.host = "not a host".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(fields(&errors), vec!["agent.log_level", "admin.host"]);
    }
}
