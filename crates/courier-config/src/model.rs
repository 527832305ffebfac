// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Courier.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Identity, logging, and system prompt settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Chat-completion model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Image generation settings.
    #[serde(default)]
    pub image: ImageConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversation pipeline tuning.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Administrative HTTP API settings.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Scheduled task settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the bot.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline default system prompt. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the default system prompt.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
        }
    }
}

fn default_agent_name() -> String {
    "courier".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables Telegram integration.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Allowed Telegram user IDs or usernames. Empty rejects everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

/// OpenAI-compatible chat-completion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the Chat Completions API.
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    /// Model name sent with every request.
    #[serde(default = "default_model_name")]
    pub model: String,

    /// Maximum tokens in a completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_model_base_url(),
            model: default_model_name(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// fal.ai image generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    /// Advertise the image generation tool to the model.
    #[serde(default)]
    pub enabled: bool,

    /// fal.ai key. `None` falls back to the `FAL_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_image_base_url")]
    pub base_url: String,

    /// Model path appended to `base_url`.
    #[serde(default = "default_image_model")]
    pub model: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            base_url: default_image_base_url(),
            model: default_image_model(),
        }
    }
}

fn default_image_base_url() -> String {
    "https://fal.run".to_string()
}

fn default_image_model() -> String {
    "fal-ai/flux/dev".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("courier").join("courier.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("courier.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Conversation pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Number of most recent messages sent to the model.
    #[serde(default = "default_context_window")]
    pub context_window: u32,

    /// Maximum model invocations per run before giving up on a tool loop.
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,

    /// How long a unit of work waits for a busy conversation.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    /// Attempts per collaborator call, including the first.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    #[serde(default = "default_retry_initial_backoff_ms")]
    pub retry_initial_backoff_ms: u64,

    #[serde(default = "default_retry_max_backoff_ms")]
    pub retry_max_backoff_ms: u64,
}

impl PipelineConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            max_tool_iterations: default_max_tool_iterations(),
            lock_timeout_secs: default_lock_timeout_secs(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_initial_backoff_ms: default_retry_initial_backoff_ms(),
            retry_max_backoff_ms: default_retry_max_backoff_ms(),
        }
    }
}

fn default_context_window() -> u32 {
    30
}

fn default_max_tool_iterations() -> u32 {
    8
}

fn default_lock_timeout_secs() -> u64 {
    180
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_initial_backoff_ms() -> u64 {
    500
}

fn default_retry_max_backoff_ms() -> u64 {
    8_000
}

/// Administrative HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    #[serde(default = "default_admin_enabled")]
    pub enabled: bool,

    /// Address to bind the admin server to.
    #[serde(default = "default_admin_host")]
    pub host: String,

    #[serde(default = "default_admin_port")]
    pub port: u16,

    /// Messages per page on the paginated listing.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: default_admin_enabled(),
            host: default_admin_host(),
            port: default_admin_port(),
            page_size: default_page_size(),
        }
    }
}

fn default_admin_enabled() -> bool {
    true
}

fn default_admin_host() -> String {
    "127.0.0.1".to_string()
}

fn default_admin_port() -> u16 {
    8080
}

fn default_page_size() -> u32 {
    50
}

/// Scheduled task configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Run due tasks and advertise the task tools to the model.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    /// Pending tasks allowed per conversation.
    #[serde(default = "default_max_pending_tasks")]
    pub max_pending_per_conversation: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            max_pending_per_conversation: default_max_pending_tasks(),
        }
    }
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_max_pending_tasks() -> u32 {
    20
}
