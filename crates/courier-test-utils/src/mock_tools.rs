// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-output tool and a scripted image generator.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{
    AdapterType, CourierError, GeneratedImage, HealthStatus, ImageGenerator, PluginAdapter,
    ToolOutput,
};
use courier_skill::Tool;

/// A tool that always returns the same output and counts its invocations.
pub struct StaticTool {
    name: String,
    output: ToolOutput,
    invocations: AtomicUsize,
    arguments: Mutex<Vec<serde_json::Value>>,
}

impl StaticTool {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_output(name, ToolOutput::success(content))
    }

    /// A tool that reports failure with `content`.
    pub fn failing(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_output(name, ToolOutput::failure(content))
    }

    fn with_output(name: impl Into<String>, output: ToolOutput) -> Self {
        Self {
            name: name.into(),
            output,
            invocations: AtomicUsize::new(0),
            arguments: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub async fn arguments(&self) -> Vec<serde_json::Value> {
        self.arguments.lock().await.clone()
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Static test tool"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, CourierError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.arguments.lock().await.push(input);
        Ok(self.output.clone())
    }
}

/// Image generator returning a fixed URL, optionally failing first.
pub struct MockImageGenerator {
    url: String,
    failures: Mutex<VecDeque<CourierError>>,
    prompts: Mutex<Vec<String>>,
}

impl MockImageGenerator {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            failures: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queues an error returned by the next call instead of the URL.
    pub async fn fail_next(&self, error: CourierError) {
        self.failures.lock().await.push_back(error);
    }

    /// Prompts received, including those of failed calls.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockImageGenerator {
    fn name(&self) -> &str {
        "mock-images"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ImageGeneration
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, CourierError> {
        self.prompts.lock().await.push(prompt.to_string());
        if let Some(error) = self.failures.lock().await.pop_front() {
            return Err(error);
        }
        Ok(GeneratedImage {
            url: self.url.clone(),
        })
    }
}
