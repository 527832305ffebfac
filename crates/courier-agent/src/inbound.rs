// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound gateway: chat events in, pipeline runs, replies out.
//!
//! Each event is handled on its own task. Events for different conversations
//! therefore proceed concurrently, while events for the same conversation are
//! ordered by the registry lock. Delivery is fire-and-forget: a failed send
//! is logged and never touches stored state.

use std::sync::Arc;
use std::time::Duration;

use courier_core::{ChatChannel, ConversationId, CourierError, InboundEvent, Role};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::admin::AdminService;
use crate::commands::Command;
use crate::pipeline::Pipeline;

/// How often the typing indicator is refreshed during a run.
pub const TYPING_INTERVAL: Duration = Duration::from_secs(5);

/// How long in-flight events may take to finish after shutdown is requested.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub const BUSY_MESSAGE: &str = "I'm still working on an earlier message. Please try again in a moment.";
pub const LOOP_FAILURE_MESSAGE: &str =
    "Sorry, I couldn't finish that: too many tool calls were needed.";

/// Connects a [`ChatChannel`] to the [`Pipeline`].
pub struct InboundGateway {
    channel: Arc<dyn ChatChannel>,
    pipeline: Arc<Pipeline>,
    admin: AdminService,
    typing_interval: Duration,
    tasks: TaskTracker,
}

impl InboundGateway {
    pub fn new(channel: Arc<dyn ChatChannel>, pipeline: Arc<Pipeline>, admin: AdminService) -> Self {
        Self {
            channel,
            pipeline,
            admin,
            typing_interval: TYPING_INTERVAL,
            tasks: TaskTracker::new(),
        }
    }

    pub fn with_typing_interval(mut self, interval: Duration) -> Self {
        self.typing_interval = interval;
        self
    }

    /// Receives events until `cancel` fires or the channel closes, then waits
    /// for in-flight events to finish.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), CourierError> {
        info!(channel = self.channel.name(), "inbound gateway running");

        loop {
            tokio::select! {
                event = self.channel.receive() => {
                    match event {
                        Ok(event) => {
                            let gateway = Arc::clone(&self);
                            self.tasks.spawn(async move {
                                gateway.handle_event(event).await;
                            });
                        }
                        Err(e) => {
                            // Receive only fails once the channel has shut down.
                            error!(error = %e, "channel receive error, stopping");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping inbound gateway");
                    break;
                }
            }
        }

        self.drain().await;
        Ok(())
    }

    /// Waits for spawned event tasks, up to a fixed timeout.
    pub async fn drain(&self) {
        self.tasks.close();
        if self.tasks.is_empty() {
            return;
        }
        info!(count = self.tasks.len(), "waiting for in-flight events to complete");
        if tokio::time::timeout(DRAIN_TIMEOUT, self.tasks.wait())
            .await
            .is_err()
        {
            warn!(remaining = self.tasks.len(), "timeout reached, some events interrupted");
        }
    }

    /// Processes one event end to end.
    pub async fn handle_event(&self, event: InboundEvent) {
        let conversation_id = event.conversation_id.clone();
        debug!(conversation_id = %conversation_id, sender = event.sender.as_str(), "handling inbound event");

        if let Some(command) = Command::parse(&event.text) {
            let reply = match command.execute(&self.admin, &conversation_id).await {
                Ok(text) => text,
                Err(e) => failure_message(&e),
            };
            self.deliver(&conversation_id, &reply).await;
            return;
        }

        let content = normalize(&event);
        let typing = self.start_typing(&conversation_id);
        let result = self
            .pipeline
            .submit(&conversation_id, Role::User, &content)
            .await;
        typing.cancel();

        match result {
            Ok(reply) => {
                for message in &reply.messages {
                    self.deliver(&conversation_id, &message.content).await;
                }
            }
            Err(e) => {
                error!(conversation_id = %conversation_id, error = %e, "failed to handle inbound event");
                self.deliver(&conversation_id, &failure_message(&e)).await;
            }
        }
    }

    async fn deliver(&self, conversation_id: &ConversationId, text: &str) {
        if text.trim().is_empty() {
            warn!(conversation_id = %conversation_id, "refusing to send empty message");
            return;
        }
        if let Err(e) = self.channel.send(conversation_id, text).await {
            error!(conversation_id = %conversation_id, error = %e, "failed to deliver message");
        }
    }

    /// Sends a typing indicator now and every interval until the returned
    /// token is cancelled.
    fn start_typing(&self, conversation_id: &ConversationId) -> CancellationToken {
        let token = CancellationToken::new();
        let stop = token.clone();
        let channel = Arc::clone(&self.channel);
        let conversation_id = conversation_id.clone();
        let interval = self.typing_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = channel.send_typing(&conversation_id).await {
                            debug!(error = %e, "failed to send typing indicator");
                        }
                    }
                }
            }
        });

        token
    }
}

/// Renders the stored form of an inbound chat message.
pub fn normalize(event: &InboundEvent) -> String {
    format!(
        "[{}] {}: {}",
        event.received_at.format("%Y-%m-%d %H:%M:%S"),
        event.sender,
        event.text.trim()
    )
}

/// User-visible text for a failed run.
pub fn failure_message(error: &CourierError) -> String {
    match error {
        CourierError::LockTimeout { .. } => BUSY_MESSAGE.to_string(),
        CourierError::ToolLoopExceeded {
            partial: Some(text),
            ..
        } => text.clone(),
        CourierError::ToolLoopExceeded { partial: None, .. } => LOOP_FAILURE_MESSAGE.to_string(),
        other => format!("Something went wrong: {other}"),
    }
}
