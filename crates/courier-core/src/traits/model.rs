// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language model trait.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ModelMessage, ModelReply, ToolDescriptor};

/// Adapter for a chat-completion model with tool calling.
#[async_trait]
pub trait ModelClient: PluginAdapter {
    /// Sends the ordered context and the available tools, returning either
    /// assistant text or the tool calls the model wants resolved.
    ///
    /// Network-level failures are reported as [`CourierError::Unavailable`];
    /// unparseable tool-call output as [`CourierError::Protocol`].
    async fn complete(
        &self,
        messages: &[ModelMessage],
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, CourierError>;
}
