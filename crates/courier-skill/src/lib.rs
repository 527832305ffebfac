// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tools the model can call.
//!
//! - [`Tool`] and [`ToolRegistry`], the registry being the pipeline's tool invoker
//! - [`builtin`] tools: current date/time and version
//! - [`fal::FalImageClient`], the image generation collaborator

pub mod builtin;
pub mod fal;
pub mod tool;

pub use fal::FalImageClient;
pub use tool::{Tool, ToolRegistry};
