// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Courier.
//!
//! This crate provides the error taxonomy, the shared data model, and the
//! collaborator traits (chat channel, model, tools, image generation,
//! message and task stores) that the orchestration crates are written against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Collaborator, CourierError};
pub use types::{
    AdapterType, ConversationId, GeneratedImage, HealthStatus, InboundEvent, Message,
    ModelMessage, ModelReply, Role, ScheduledTask, ToolCall, ToolDescriptor, ToolOutput,
};

pub use traits::{
    ChatChannel, ImageGenerator, MessageStore, ModelClient, PluginAdapter, TaskStore,
    ToolInvoker,
};
