// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Current date and time.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use courier_core::{CourierError, ToolOutput};

use crate::tool::Tool;

pub struct CurrentDateTimeTool;

#[async_trait]
impl Tool for CurrentDateTimeTool {
    fn name(&self) -> &str {
        "current_date_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time in UTC (RFC 3339)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, _input: serde_json::Value) -> Result<ToolOutput, CourierError> {
        Ok(ToolOutput::success(
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        ))
    }
}
