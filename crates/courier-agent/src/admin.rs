// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator-facing operations on stored conversations.
//!
//! Every mutation takes the same per-conversation lock as the pipeline, so
//! an edit can never interleave with an in-flight model run. Reads are
//! lock-free snapshots.

use std::sync::Arc;

use courier_core::{
    ChatChannel, Collaborator, ConversationId, CourierError, Message, MessageStore, Role,
    ScheduledTask,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::pipeline::{Pipeline, PipelineReply};
use crate::registry::{ConversationRegistry, LockToken};
use crate::scheduler::{TaskScheduler, parse_due_at};

/// A full conversation as shown to operators.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub id: ConversationId,
    pub system_message: Option<String>,
    pub messages: Vec<Message>,
}

/// Administrative operations shared by the HTTP API and chat commands.
#[derive(Clone)]
pub struct AdminService {
    pipeline: Arc<Pipeline>,
    channel: Option<Arc<dyn ChatChannel>>,
    page_size: u32,
}

impl AdminService {
    pub fn new(pipeline: Arc<Pipeline>, page_size: u32) -> Self {
        Self {
            pipeline,
            channel: None,
            page_size: page_size.max(1),
        }
    }

    /// Enables broadcasts through `channel`.
    pub fn with_channel(mut self, channel: Arc<dyn ChatChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn store(&self) -> &Arc<dyn MessageStore> {
        self.pipeline.store()
    }

    fn registry(&self) -> &Arc<ConversationRegistry> {
        self.pipeline.registry()
    }

    fn scheduler(&self) -> Result<&Arc<TaskScheduler>, CourierError> {
        self.pipeline
            .scheduler()
            .ok_or_else(|| CourierError::InvalidInput("task scheduling is disabled".into()))
    }

    async fn lock(&self, conversation_id: &ConversationId) -> Result<LockToken, CourierError> {
        self.registry()
            .acquire(conversation_id, self.pipeline.settings().lock_timeout)
            .await
    }

    /// One page of messages, oldest first.
    pub async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        page: u32,
    ) -> Result<Vec<Message>, CourierError> {
        self.store()
            .list(conversation_id, page, self.page_size)
            .await
    }

    pub async fn conversation_ids(&self) -> Result<Vec<ConversationId>, CourierError> {
        self.store().conversation_ids().await
    }

    /// Every message plus the system message. Unknown conversations are `NotFound`.
    pub async fn conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<ConversationView, CourierError> {
        let system_message = self.store().system_message(conversation_id).await?;
        let messages = self.store().messages(conversation_id).await?;
        if messages.is_empty() && system_message.is_none() {
            let known = self.store().conversation_ids().await?;
            if !known.contains(conversation_id) {
                return Err(CourierError::conversation_not_found(conversation_id.as_str()));
            }
        }
        Ok(ConversationView {
            id: conversation_id.clone(),
            system_message,
            messages,
        })
    }

    pub async fn update_message(
        &self,
        conversation_id: &ConversationId,
        message_id: i64,
        content: &str,
    ) -> Result<Message, CourierError> {
        let _token = self.lock(conversation_id).await?;
        let message = self
            .store()
            .update(conversation_id, message_id, content)
            .await?;
        info!(conversation_id = %conversation_id, message_id, "message updated by operator");
        Ok(message)
    }

    pub async fn delete_message(
        &self,
        conversation_id: &ConversationId,
        message_id: i64,
    ) -> Result<(), CourierError> {
        let _token = self.lock(conversation_id).await?;
        self.store().delete(conversation_id, message_id).await?;
        info!(conversation_id = %conversation_id, message_id, "message deleted by operator");
        Ok(())
    }

    /// Appends a message without running the model.
    pub async fn add_message(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<Message, CourierError> {
        let _token = self.lock(conversation_id).await?;
        self.store().append(conversation_id, role, content).await
    }

    pub async fn set_system_message(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<(), CourierError> {
        if content.trim().is_empty() {
            return Err(CourierError::InvalidInput(
                "system message must not be empty".into(),
            ));
        }
        let _token = self.lock(conversation_id).await?;
        self.store()
            .set_system_message(conversation_id, content)
            .await?;
        info!(conversation_id = %conversation_id, "system message set");
        Ok(())
    }

    /// Removes a conversation and its history. Returns the number of
    /// messages removed.
    pub async fn delete_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<u64, CourierError> {
        let _token = self.lock(conversation_id).await?;
        let removed = self.store().delete_conversation(conversation_id).await?;
        info!(conversation_id = %conversation_id, removed, "conversation deleted");
        Ok(removed)
    }

    /// The conversation's profile. `NotFound` when none was set.
    pub async fn profile(&self, conversation_id: &ConversationId) -> Result<String, CourierError> {
        self.store()
            .profile(conversation_id)
            .await?
            .ok_or_else(|| CourierError::NotFound {
                entity: "profile",
                conversation_id: conversation_id.to_string(),
                message_id: None,
            })
    }

    /// Replaces the profile that is folded into the system prompt.
    pub async fn set_profile(
        &self,
        conversation_id: &ConversationId,
        profile: &str,
    ) -> Result<(), CourierError> {
        if profile.trim().is_empty() {
            return Err(CourierError::InvalidInput("profile must not be empty".into()));
        }
        let _token = self.lock(conversation_id).await?;
        self.store().set_profile(conversation_id, profile.trim()).await?;
        info!(conversation_id = %conversation_id, "profile set");
        Ok(())
    }

    /// Every pending task, earliest first.
    pub async fn tasks(&self) -> Result<Vec<ScheduledTask>, CourierError> {
        self.scheduler()?.tasks().await
    }

    pub async fn conversation_tasks(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ScheduledTask>, CourierError> {
        self.scheduler()?.tasks_for(conversation_id).await
    }

    /// Schedules `prompt` to run in the conversation at `due_at`, given in
    /// any form [`parse_due_at`] accepts.
    pub async fn schedule_task(
        &self,
        conversation_id: &ConversationId,
        prompt: &str,
        due_at: &str,
        key: Option<&str>,
    ) -> Result<ScheduledTask, CourierError> {
        let scheduler = self.scheduler()?;
        let due_at = parse_due_at(due_at)?;
        scheduler
            .schedule(conversation_id, prompt, due_at, key.filter(|k| !k.trim().is_empty()))
            .await
    }

    pub async fn cancel_task(
        &self,
        conversation_id: &ConversationId,
        key: &str,
    ) -> Result<ScheduledTask, CourierError> {
        self.scheduler()?.cancel(conversation_id, key).await
    }

    /// Runs `text` through the pipeline as a user message.
    pub async fn prompt(
        &self,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<PipelineReply, CourierError> {
        if text.trim().is_empty() {
            return Err(CourierError::InvalidInput("prompt must not be empty".into()));
        }
        self.pipeline.submit(conversation_id, Role::User, text).await
    }

    /// Sends `text` to every known conversation except the anonymous one.
    /// Returns how many deliveries succeeded.
    pub async fn broadcast(&self, text: &str) -> Result<usize, CourierError> {
        if text.trim().is_empty() {
            return Err(CourierError::InvalidInput(
                "broadcast message must not be empty".into(),
            ));
        }
        let channel = self.channel.as_ref().ok_or_else(|| CourierError::Unavailable {
            collaborator: Collaborator::ChatPlatform,
            message: "no chat channel is configured".into(),
            source: None,
        })?;

        let mut delivered = 0;
        for id in self.store().conversation_ids().await? {
            if id.as_str() == ConversationId::ANONYMOUS {
                continue;
            }
            match channel.send(&id, text).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(conversation_id = %id, error = %e, "broadcast delivery failed"),
            }
        }
        info!(delivered, "broadcast sent");
        Ok(delivered)
    }
}
