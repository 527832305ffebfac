// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat channel trait for the messaging platform integration.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationId, InboundEvent};

/// Bidirectional text channel to the chat platform.
#[async_trait]
pub trait ChatChannel: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), CourierError>;

    /// Receives the next inbound event.
    async fn receive(&self) -> Result<InboundEvent, CourierError>;

    /// Delivers text to a conversation.
    async fn send(&self, conversation_id: &ConversationId, text: &str)
    -> Result<(), CourierError>;

    /// Shows a typing indicator. Channels without one ignore the call.
    async fn send_typing(&self, _conversation_id: &ConversationId) -> Result<(), CourierError> {
        Ok(())
    }
}
