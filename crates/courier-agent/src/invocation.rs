// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory state of one model invocation loop. Never persisted.

use courier_core::{ModelMessage, ToolCall, ToolOutput};
use serde::Serialize;

/// State carried across the tool-call iterations of a single pipeline run.
#[derive(Debug, Clone)]
pub struct PendingInvocation {
    /// History snapshot plus everything added during this run.
    context: Vec<ModelMessage>,
    /// Number of model calls made so far.
    iterations: u32,
    /// Text the model emitted alongside tool calls, in order.
    intermediate: Vec<String>,
}

impl PendingInvocation {
    pub fn new(context: Vec<ModelMessage>) -> Self {
        Self {
            context,
            iterations: 0,
            intermediate: Vec::new(),
        }
    }

    pub fn context(&self) -> &[ModelMessage] {
        &self.context
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Counts one model call.
    pub fn record_model_call(&mut self) {
        self.iterations += 1;
    }

    /// Records an assistant turn that requested tools.
    pub fn push_tool_calls(&mut self, text: Option<String>, calls: Vec<ToolCall>) {
        if let Some(ref text) = text
            && !text.trim().is_empty()
        {
            self.intermediate.push(text.clone());
        }
        self.context
            .push(ModelMessage::assistant_with_calls(text, calls));
    }

    pub fn push_tool_result(&mut self, call: &ToolCall, output: &ToolOutput) {
        self.context
            .push(ModelMessage::tool_result(&call.id, &output.content));
    }

    /// Assistant text emitted alongside tool calls during this run.
    pub fn intermediate_texts(&self) -> &[String] {
        &self.intermediate
    }

    /// The most recent assistant text seen, if any.
    pub fn last_text(&self) -> Option<String> {
        self.intermediate.last().cloned()
    }
}

#[derive(Serialize)]
struct ToolRecord<'a> {
    call: &'a ToolCall,
    result: &'a ToolOutput,
}

/// Renders the content of a persisted `tool` message.
pub fn tool_message_content(call: &ToolCall, output: &ToolOutput) -> String {
    let record = ToolRecord {
        call,
        result: output,
    };
    // Both halves are plain data; serialization cannot fail.
    serde_json::to_string(&record).unwrap_or_else(|_| output.content.clone())
}
