// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The model invocation pipeline.
//!
//! A run holds the conversation lock from the moment the triggering message
//! is appended until the final assistant message is durable:
//!
//! 1. acquire the conversation lock (bounded wait)
//! 2. append the triggering message
//! 3. snapshot the recent history behind the system prompt
//! 4. call the model; persist any text it sent alongside tool calls, resolve
//!    the calls (image generation and task tools included), persisting each
//!    call/result pair, and call the model again
//! 5. append the final assistant message and release the lock
//!
//! A failed run leaves the triggering message and any intermediate steps in
//! place and appends no final assistant message.

use std::sync::Arc;
use std::time::Duration;

use courier_config::model::PipelineConfig;
use courier_core::{
    ConversationId, CourierError, ImageGenerator, Message, MessageStore, ModelClient,
    ModelReply, Role, ToolCall, ToolDescriptor, ToolInvoker, ToolOutput,
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::context::build_context;
use crate::invocation::{PendingInvocation, tool_message_content};
use crate::registry::ConversationRegistry;
use crate::retry::RetryPolicy;
use crate::scheduler::TaskScheduler;

/// Name of the tool routed to the [`ImageGenerator`].
pub const IMAGE_TOOL_NAME: &str = "generate_image";

/// Tuning knobs for a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Messages of history included in each model call.
    pub context_window: u32,
    /// Model calls allowed per run.
    pub max_tool_iterations: u32,
    pub lock_timeout: Duration,
    pub retry: RetryPolicy,
    /// Used when the conversation has no system message of its own.
    pub default_system_prompt: String,
}

impl PipelineSettings {
    pub fn from_config(config: &PipelineConfig, default_system_prompt: impl Into<String>) -> Self {
        Self {
            context_window: config.context_window,
            max_tool_iterations: config.max_tool_iterations,
            lock_timeout: config.lock_timeout(),
            retry: RetryPolicy::from_config(config),
            default_system_prompt: default_system_prompt.into(),
        }
    }
}

/// Assistant messages appended by one successful run, in id order.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReply {
    pub messages: Vec<Message>,
}

impl PipelineReply {
    /// Content of the final assistant message.
    pub fn final_text(&self) -> &str {
        self.messages.last().map(|m| m.content.as_str()).unwrap_or("")
    }

    /// All assistant contents joined for single-response surfaces.
    pub fn text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Drives model runs for conversations.
pub struct Pipeline {
    store: Arc<dyn MessageStore>,
    registry: Arc<ConversationRegistry>,
    model: Arc<dyn ModelClient>,
    tools: Arc<dyn ToolInvoker>,
    images: Option<Arc<dyn ImageGenerator>>,
    scheduler: Option<Arc<TaskScheduler>>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: Arc<ConversationRegistry>,
        model: Arc<dyn ModelClient>,
        tools: Arc<dyn ToolInvoker>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            registry,
            model,
            tools,
            images: None,
            scheduler: None,
            settings,
        }
    }

    /// Enables the `generate_image` tool.
    pub fn with_image_generator(mut self, images: Arc<dyn ImageGenerator>) -> Self {
        self.images = Some(images);
        self
    }

    /// Enables the task tools, bound to the conversation of each run.
    pub fn with_scheduler(mut self, scheduler: Arc<TaskScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn scheduler(&self) -> Option<&Arc<TaskScheduler>> {
        self.scheduler.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ConversationRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Appends `content` as `role` and runs the model until it produces a
    /// final answer.
    pub async fn submit(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<PipelineReply, CourierError> {
        let mut token = self
            .registry
            .acquire(conversation_id, self.settings.lock_timeout)
            .await?;
        let result = self.run_locked(conversation_id, role, content).await;
        self.registry.release(&mut token);

        match &result {
            Ok(reply) => info!(
                conversation_id = %conversation_id,
                assistant_messages = reply.messages.len(),
                "pipeline run completed"
            ),
            Err(e) => warn!(conversation_id = %conversation_id, error = %e, "pipeline run failed"),
        }
        result
    }

    async fn run_locked(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<PipelineReply, CourierError> {
        let trigger = self.store.append(conversation_id, role, content).await?;
        debug!(conversation_id = %conversation_id, message_id = trigger.id, "trigger appended");

        let history = self
            .store
            .history(conversation_id, self.settings.context_window)
            .await?;
        let system_message = self.store.system_message(conversation_id).await?;
        let profile = self.store.profile(conversation_id).await?;
        let mut pending = PendingInvocation::new(build_context(
            system_message.as_deref(),
            &self.settings.default_system_prompt,
            profile.as_deref(),
            &history,
        ));
        let descriptors = self.descriptors();
        let mut messages = Vec::new();

        let final_text = loop {
            if pending.iterations() >= self.settings.max_tool_iterations {
                return Err(CourierError::ToolLoopExceeded {
                    iterations: pending.iterations(),
                    partial: pending.last_text(),
                });
            }

            pending.record_model_call();
            let reply = self
                .settings
                .retry
                .run("model.complete", || {
                    self.model.complete(pending.context(), &descriptors)
                })
                .await?;

            match reply {
                ModelReply::Text(text) if text.trim().is_empty() => {
                    return Err(CourierError::Protocol(
                        "model returned an empty reply".into(),
                    ));
                }
                ModelReply::Text(text) => break text,
                ModelReply::ToolCalls { text, calls } => {
                    debug!(
                        conversation_id = %conversation_id,
                        iteration = pending.iterations(),
                        calls = calls.len(),
                        "model requested tools"
                    );
                    if let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) {
                        messages.push(
                            self.store
                                .append(conversation_id, Role::Assistant, text)
                                .await?,
                        );
                    }
                    pending.push_tool_calls(text, calls.clone());
                    for call in &calls {
                        let output = self.resolve(conversation_id, call).await?;
                        self.store
                            .append(
                                conversation_id,
                                Role::Tool,
                                &tool_message_content(call, &output),
                            )
                            .await?;
                        pending.push_tool_result(call, &output);
                    }
                }
            }
        };

        messages.push(
            self.store
                .append(conversation_id, Role::Assistant, &final_text)
                .await?,
        );
        Ok(PipelineReply { messages })
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors = self.tools.descriptors();
        if self.images.is_some() {
            descriptors.push(image_tool_descriptor());
        }
        if let Some(scheduler) = &self.scheduler {
            descriptors.extend(scheduler.descriptors());
        }
        descriptors
    }

    /// Resolves one tool call. Tool-level failures come back as an
    /// [`ToolOutput`] with `is_error` set.
    async fn resolve(
        &self,
        conversation_id: &ConversationId,
        call: &ToolCall,
    ) -> Result<ToolOutput, CourierError> {
        if TaskScheduler::handles(&call.name)
            && let Some(scheduler) = &self.scheduler
        {
            let output = scheduler.invoke_tool(conversation_id, call).await?;
            debug!(tool = call.name.as_str(), is_error = output.is_error, "task tool resolved");
            return Ok(output);
        }

        if call.name == IMAGE_TOOL_NAME
            && let Some(images) = &self.images
        {
            let Some(prompt) = call.arguments.get("prompt").and_then(|p| p.as_str()) else {
                return Ok(ToolOutput::failure(
                    "generate_image requires a string `prompt` argument",
                ));
            };
            let image = self
                .settings
                .retry
                .run("image.generate", || images.generate(prompt))
                .await?;
            info!(tool = IMAGE_TOOL_NAME, "image generated");
            return Ok(ToolOutput::success(image.url));
        }

        let output = self
            .settings
            .retry
            .run("tool.invoke", || {
                self.tools.invoke(&call.name, call.arguments.clone())
            })
            .await?;
        if output.is_error {
            warn!(tool = call.name.as_str(), error = %output.content, "tool reported failure");
        }
        Ok(output)
    }
}

fn image_tool_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: IMAGE_TOOL_NAME.to_string(),
        description: "Generates an image from a text description and returns its URL.".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Detailed description of the image to generate"
                }
            },
            "required": ["prompt"]
        }),
    }
}
