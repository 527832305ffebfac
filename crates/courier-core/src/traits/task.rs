// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled task store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CourierError;
use crate::types::{ConversationId, ScheduledTask};

/// Durable set of pending scheduled tasks.
///
/// A task is removed once it has fired or been cancelled, so everything
/// the store returns is still pending.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a new task. Fails with `InvalidInput` if the conversation
    /// already has a task under the same key.
    async fn add_task(&self, task: &ScheduledTask) -> Result<(), CourierError>;

    /// Every pending task, earliest due first.
    async fn tasks(&self) -> Result<Vec<ScheduledTask>, CourierError>;

    /// Pending tasks of one conversation, earliest due first.
    async fn tasks_for(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ScheduledTask>, CourierError>;

    /// Tasks due at or before `now`, earliest first.
    async fn due_tasks(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledTask>, CourierError>;

    /// Due time of the earliest pending task.
    async fn next_due(&self) -> Result<Option<DateTime<Utc>>, CourierError>;

    /// Removes a task and returns it, or `None` if no such task is pending.
    async fn remove_task(
        &self,
        conversation_id: &ConversationId,
        key: &str,
    ) -> Result<Option<ScheduledTask>, CourierError>;
}
