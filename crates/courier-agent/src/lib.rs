// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation orchestration for Courier.
//!
//! - [`ConversationRegistry`] serializes work per conversation
//! - [`Pipeline`] runs the model with tools and image generation and
//!   persists every step
//! - [`InboundGateway`] feeds chat events through the pipeline and delivers
//!   the replies
//! - [`TaskScheduler`] runs scheduled prompts through the pipeline when due
//! - [`AdminService`] exposes operator reads and edits under the same locks

pub mod admin;
pub mod commands;
pub mod context;
pub mod inbound;
pub mod invocation;
pub mod pipeline;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod shutdown;

pub use admin::{AdminService, ConversationView};
pub use commands::Command;
pub use context::load_system_prompt;
pub use inbound::InboundGateway;
pub use invocation::PendingInvocation;
pub use pipeline::{IMAGE_TOOL_NAME, Pipeline, PipelineReply, PipelineSettings};
pub use registry::{ConversationRegistry, LockToken};
pub use retry::RetryPolicy;
pub use scheduler::{TaskScheduler, parse_due_at};
pub use shutdown::install_signal_handler;
