// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits.
//!
//! External adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod image;
pub mod model;
pub mod store;
pub mod task;
pub mod tool;

pub use adapter::PluginAdapter;
pub use channel::ChatChannel;
pub use image::ImageGenerator;
pub use model::ModelClient;
pub use store::MessageStore;
pub use task::TaskStore;
pub use tool::ToolInvoker;
