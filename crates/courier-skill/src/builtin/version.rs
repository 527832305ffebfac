// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reports the running Courier version.

use async_trait::async_trait;
use courier_core::{CourierError, ToolOutput};

use crate::tool::Tool;

pub struct VersionTool {
    version: String,
}

impl VersionTool {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl Default for VersionTool {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

#[async_trait]
impl Tool for VersionTool {
    fn name(&self) -> &str {
        "courier_version"
    }

    fn description(&self) -> &str {
        "Get the version of the bot software answering this chat"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, _input: serde_json::Value) -> Result<ToolOutput, CourierError> {
        Ok(ToolOutput::success(&self.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_configured_version() {
        let out = VersionTool::new("9.9.9")
            .invoke(serde_json::Value::Null)
            .await
            .unwrap();
        assert_eq!(out.content, "9.9.9");
    }
}
