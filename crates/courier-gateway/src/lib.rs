// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrative HTTP API for Courier.
//!
//! A thin axum layer over [`courier_agent::AdminService`]: message listing
//! and edits, conversation management, prompt and system-message injection,
//! and broadcasts. Mutations go through the same per-conversation lock as
//! the pipeline.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ErrorResponse};
pub use server::{GatewayState, ServerConfig, router, start_server};
