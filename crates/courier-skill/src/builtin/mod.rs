// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tools, always available to the model.

pub mod clock;
pub mod version;

pub use clock::CurrentDateTimeTool;
pub use version::VersionTool;

use std::sync::Arc;

use crate::ToolRegistry;

/// Registers all built-in tools into the given registry.
pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(Arc::new(CurrentDateTimeTool));
    registry.register(Arc::new(VersionTool::default()));
}
