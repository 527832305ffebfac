// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool invocation trait.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{ToolDescriptor, ToolOutput};

/// Resolves tool calls by name.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Tools to advertise to the model.
    fn descriptors(&self) -> Vec<ToolDescriptor>;

    /// Invokes `name` with structured arguments.
    ///
    /// An unknown tool or a tool-level failure yields `Ok` with
    /// [`ToolOutput::is_error`] set; `Err` is reserved for failures that
    /// should abort the run.
    async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, CourierError>;
}
