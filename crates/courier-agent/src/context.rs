// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context assembly for model requests.
//!
//! Loads the default system prompt from config and turns a history snapshot
//! and the user profile into the ordered message list sent to the model.

use courier_config::model::AgentConfig;
use courier_core::{CourierError, Message, ModelMessage, Role};
use tracing::{info, warn};

/// Loads the system prompt following config priority: file > inline > default.
///
/// # Priority
/// 1. `config.system_prompt_file` -- reads from disk
/// 2. `config.system_prompt` -- inline string
/// 3. Default: "You are {name}, a helpful assistant in a chat."
pub async fn load_system_prompt(config: &AgentConfig) -> Result<String, CourierError> {
    if let Some(ref file_path) = config.system_prompt_file {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) => {
                let trimmed = content.trim().to_string();
                if !trimmed.is_empty() {
                    info!(path = file_path.as_str(), "loaded system prompt from file");
                    return Ok(trimmed);
                }
            }
            Err(e) => {
                warn!(
                    path = file_path.as_str(),
                    error = %e,
                    "failed to read system prompt file, falling back"
                );
            }
        }
    }

    if let Some(ref prompt) = config.system_prompt
        && !prompt.is_empty()
    {
        return Ok(prompt.clone());
    }

    Ok(format!(
        "You are {}, a helpful assistant in a chat.",
        config.name
    ))
}

/// Introduces the user profile inside the system prompt.
pub const PROFILE_PREAMBLE: &str = "This is the profile of the user you are talking to. \
Use it to give the best, most personalized answer possible:";

/// Builds the model context: the system prompt followed by `history` in order.
///
/// `system_message` is the conversation's own system message; when absent
/// the configured default prompt is used instead. A non-blank `profile` is
/// appended to the system prompt.
pub fn build_context(
    system_message: Option<&str>,
    default_prompt: &str,
    profile: Option<&str>,
    history: &[Message],
) -> Vec<ModelMessage> {
    let system = system_message
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_prompt);
    let system = match profile.map(str::trim).filter(|p| !p.is_empty()) {
        Some(profile) => format!("{system}\n\n{PROFILE_PREAMBLE}\n{profile}"),
        None => system.to_string(),
    };

    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ModelMessage::new(Role::System, system));
    messages.extend(history.iter().map(ModelMessage::from));
    messages
}
