// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI Chat Completions model adapter for Courier.
//!
//! This crate implements [`ModelClient`] against any endpoint that speaks
//! the OpenAI `chat/completions` protocol with function calling.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use courier_config::model::ModelConfig;
use courier_core::{
    AdapterType, CourierError, HealthStatus, ModelClient, ModelMessage, ModelReply,
    PluginAdapter, Role, ToolCall, ToolDescriptor,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{
    ApiTool, ApiToolCall, ChatMessage, ChatRequest, FunctionCall, FunctionDefinition,
};

/// Model adapter implementing [`ModelClient`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiModel {
    client: OpenAiClient,
    model: String,
    max_tokens: u32,
}

impl OpenAiModel {
    /// Creates a new adapter from the `[model]` config section.
    pub fn new(config: &ModelConfig) -> Result<Self, CourierError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        info!(model = config.model, base_url = config.base_url, "model adapter initialized");

        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn to_chat_request(&self, messages: &[ModelMessage], tools: &[ToolDescriptor]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: messages.iter().map(to_chat_message).collect(),
            max_tokens: self.max_tokens,
            tools: tools
                .iter()
                .map(|t| ApiTool {
                    tool_type: "function",
                    function: FunctionDefinition {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.parameters.clone(),
                    },
                })
                .collect(),
        }
    }
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, CourierError> {
    if let Some(key) = config_key.as_ref().filter(|k| !k.is_empty()) {
        return Ok(key.clone());
    }
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(CourierError::Config(
            "model API key not found: set model.api_key or OPENAI_API_KEY".into(),
        )),
    }
}

/// Maps one context entry onto the wire format.
///
/// Tool messages loaded from history carry no call id, so they cannot be
/// paired with an assistant call and are replayed as system notes instead.
fn to_chat_message(msg: &ModelMessage) -> ChatMessage {
    match (msg.role, &msg.tool_call_id) {
        (Role::Tool, Some(call_id)) => ChatMessage {
            role: "tool".into(),
            content: Some(msg.content.clone()),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.clone()),
        },
        (Role::Tool, None) => ChatMessage {
            role: "system".into(),
            content: Some(format!("[tool] {}", msg.content)),
            tool_calls: Vec::new(),
            tool_call_id: None,
        },
        (Role::Assistant, _) if !msg.tool_calls.is_empty() => ChatMessage {
            role: "assistant".into(),
            content: (!msg.content.is_empty()).then(|| msg.content.clone()),
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| ApiToolCall {
                    id: call.id.clone(),
                    call_type: types::function_type(),
                    function: FunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.to_string(),
                    },
                })
                .collect(),
            tool_call_id: None,
        },
        (role, _) => ChatMessage {
            role: role.to_string(),
            content: Some(msg.content.clone()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        },
    }
}

/// Parses the model's JSON-string arguments. Empty means no arguments.
fn parse_call(call: ApiToolCall) -> Result<ToolCall, CourierError> {
    let raw = call.function.arguments.trim();
    let arguments = if raw.is_empty() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(raw).map_err(|e| {
            CourierError::Protocol(format!(
                "tool call {} ({}) has unparseable arguments: {e}",
                call.id, call.function.name
            ))
        })?
    };
    if !arguments.is_object() {
        return Err(CourierError::Protocol(format!(
            "tool call {} ({}) arguments must be a JSON object",
            call.id, call.function.name
        )));
    }
    Ok(ToolCall {
        id: call.id,
        name: call.function.name,
        arguments,
    })
}

#[async_trait]
impl PluginAdapter for OpenAiModel {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Model
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        // Avoid spending tokens on health checks.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        debug!("model adapter shutting down");
        Ok(())
    }
}

#[async_trait]
impl ModelClient for OpenAiModel {
    async fn complete(
        &self,
        messages: &[ModelMessage],
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, CourierError> {
        let request = self.to_chat_request(messages, tools);
        let response = self.client.complete(&request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CourierError::Protocol("completion has no choices".into()))?;
        debug!(finish_reason = ?choice.finish_reason, "completion choice");

        let text = choice.message.content.filter(|t| !t.is_empty());
        if choice.message.tool_calls.is_empty() {
            return Ok(ModelReply::Text(text.unwrap_or_default()));
        }

        let calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(parse_call)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ModelReply::ToolCalls { text, calls })
    }
}
