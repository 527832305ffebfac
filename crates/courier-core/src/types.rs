// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the store, the pipeline, and the adapters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a conversation, as assigned by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Conversation used for prompts submitted without a chat.
    pub const ANONYMOUS: &'static str = "0";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for ConversationId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// Author of a stored message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

/// A persisted message. Only `content` is mutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Per-conversation sequence number, starting at 1.
    pub id: i64,
    pub conversation_id: ConversationId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Model,
    Storage,
    ImageGeneration,
}

/// A text event received from the chat platform.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub conversation_id: ConversationId,
    /// Display name of the sender, used to prefix the stored content.
    pub sender: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id linking the call to its result.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Tool definition advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool's arguments.
    pub parameters: serde_json::Value,
}

/// Output of a tool invocation.
///
/// `is_error` marks a failure indication that is fed back to the model,
/// as opposed to an `Err` which aborts the pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// One entry of the context sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMessage {
    pub role: Role,
    pub content: String,
    /// Calls issued by an assistant turn.
    pub tool_calls: Vec<ToolCall>,
    /// Set on tool results produced during the current run.
    pub tool_call_id: Option<String>,
}

impl ModelMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant_with_calls(text: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.unwrap_or_default(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

impl From<&Message> for ModelMessage {
    fn from(msg: &Message) -> Self {
        Self::new(msg.role, msg.content.clone())
    }
}

/// What the model returned for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Final assistant text.
    Text(String),
    /// The model wants tools resolved before it can answer.
    ToolCalls {
        /// Text emitted alongside the calls, if any.
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
}

/// A prompt scheduled to run through the pipeline at a later time.
///
/// `key` is unique within its conversation and is how operators and the
/// model refer to the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub key: String,
    pub conversation_id: ConversationId,
    pub prompt: String,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' scheduled for {}",
            self.key,
            self.due_at.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

/// Reference to a generated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_round_trips_lowercase() {
        for role in [Role::User, Role::Assistant, Role::System, Role::Tool] {
            let s = role.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(Role::from_str(&s).unwrap(), role);
        }
        assert!(Role::from_str("moderator").is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn conversation_id_from_chat_id() {
        let id = ConversationId::from(-100123_i64);
        assert_eq!(id.as_str(), "-100123");
        assert_eq!(ConversationId::anonymous().as_str(), "0");
    }

    #[test]
    fn conversation_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&ConversationId::new("77")).unwrap();
        assert_eq!(json, "\"77\"");
    }

    #[test]
    fn scheduled_task_display_names_key_and_time() {
        use chrono::TimeZone;

        let task = ScheduledTask {
            key: "water-plants".into(),
            conversation_id: "9".into(),
            prompt: "remind me to water the plants".into(),
            due_at: Utc.with_ymd_and_hms(2026, 5, 2, 18, 30, 0).unwrap(),
            created_at: Utc::now(),
        };
        assert_eq!(
            task.to_string(),
            "'water-plants' scheduled for 2026-05-02 18:30 UTC"
        );
    }

    #[test]
    fn model_message_from_stored_message_drops_linkage() {
        let msg = Message {
            id: 4,
            conversation_id: "1".into(),
            role: Role::Tool,
            content: "{}".into(),
            timestamp: Utc::now(),
        };
        let m = ModelMessage::from(&msg);
        assert_eq!(m.role, Role::Tool);
        assert!(m.tool_call_id.is_none());
        assert!(m.tool_calls.is_empty());
    }
}
