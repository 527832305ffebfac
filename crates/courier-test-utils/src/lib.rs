// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockModel`] - Scripted model client with call capture and gating
//! - [`MockChannel`] - Chat channel with event injection and capture
//! - [`StaticTool`] and [`MockImageGenerator`] - Fixed-output collaborators
//! - [`TestHarness`] - Temp SQLite store, registry, and pipeline wired together

pub mod harness;
pub mod mock_channel;
pub mod mock_model;
pub mod mock_tools;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::MockChannel;
pub use mock_model::{MockModel, ModelGate, tool_call_reply};
pub use mock_tools::{MockImageGenerator, StaticTool};
