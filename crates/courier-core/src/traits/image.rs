// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image generation trait.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::GeneratedImage;

/// Adapter for a text-to-image service.
#[async_trait]
pub trait ImageGenerator: PluginAdapter {
    /// Generates an image for `prompt` and returns a reference to it.
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, CourierError>;
}
