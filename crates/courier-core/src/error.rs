// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Courier.

use std::time::Duration;

use strum::Display;
use thiserror::Error;

/// The external service an [`CourierError::Unavailable`] or
/// [`CourierError::Collaborator`] error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Collaborator {
    Model,
    Tool,
    ImageGeneration,
    ChatPlatform,
}

/// The primary error type used across Courier crates.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence failure. The operation must be treated as not having happened.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The referenced conversation or message does not exist.
    #[error("{entity} not found in conversation {conversation_id}")]
    NotFound {
        entity: &'static str,
        conversation_id: String,
        message_id: Option<i64>,
    },

    /// The conversation lock could not be acquired in time.
    #[error("conversation {conversation_id} is busy (waited {waited:?})")]
    LockTimeout {
        conversation_id: String,
        waited: Duration,
    },

    /// The model kept requesting tools past the configured bound.
    #[error("tool-call loop exceeded {iterations} iterations")]
    ToolLoopExceeded {
        iterations: u32,
        /// Last assistant text produced before the bound was hit.
        partial: Option<String>,
    },

    /// Malformed model or tool output. Never retried.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Network-level or transient failure talking to a collaborator.
    #[error("{collaborator} unavailable: {message}")]
    Unavailable {
        collaborator: Collaborator,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A collaborator rejected the request.
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: Collaborator,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Chat channel errors (connection failure, delivery failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid input supplied by a caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Shorthand for a missing message.
    pub fn message_not_found(conversation_id: impl Into<String>, message_id: i64) -> Self {
        Self::NotFound {
            entity: "message",
            conversation_id: conversation_id.into(),
            message_id: Some(message_id),
        }
    }

    /// Shorthand for a missing conversation.
    pub fn conversation_not_found(conversation_id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "conversation",
            conversation_id: conversation_id.into(),
            message_id: None,
        }
    }

    /// Whether the whole unit of work may be retried later.
    ///
    /// Only network-level collaborator failures and lock contention qualify.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::LockTimeout { .. })
    }
}
