// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store trait.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{ConversationId, Message, Role};

/// Durable, ordered message log per conversation.
///
/// The store does not lock conversations; callers serialize mutations of a
/// conversation through the conversation registry. Implementations must
/// still be safe for concurrent use across conversations.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends a message, assigning the next id and the current timestamp.
    /// The write is durable when this returns.
    async fn append(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<Message, CourierError>;

    /// Messages ordered by id, skipping `page * page_size`. Missing
    /// conversations or pages yield an empty list.
    async fn list(
        &self,
        conversation_id: &ConversationId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Message>, CourierError>;

    /// Every message of the conversation, ordered by id.
    async fn messages(&self, conversation_id: &ConversationId)
    -> Result<Vec<Message>, CourierError>;

    /// Replaces a message's content in place.
    async fn update(
        &self,
        conversation_id: &ConversationId,
        message_id: i64,
        content: &str,
    ) -> Result<Message, CourierError>;

    /// Removes a message without renumbering the rest.
    async fn delete(&self, conversation_id: &ConversationId, message_id: i64)
    -> Result<(), CourierError>;

    /// Snapshot of the most recent `max_messages`, oldest first.
    async fn history(
        &self,
        conversation_id: &ConversationId,
        max_messages: u32,
    ) -> Result<Vec<Message>, CourierError>;

    async fn system_message(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<String>, CourierError>;

    async fn set_system_message(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<(), CourierError>;

    /// Operator-maintained notes about the person behind the conversation.
    async fn profile(&self, conversation_id: &ConversationId)
    -> Result<Option<String>, CourierError>;

    /// Sets or replaces the profile. Profiles outlive the message history.
    async fn set_profile(
        &self,
        conversation_id: &ConversationId,
        profile: &str,
    ) -> Result<(), CourierError>;

    /// Ids of every known conversation.
    async fn conversation_ids(&self) -> Result<Vec<ConversationId>, CourierError>;

    /// Drops a conversation with all its messages. Returns the number of
    /// messages removed.
    async fn delete_conversation(&self, conversation_id: &ConversationId)
    -> Result<u64, CourierError>;
}
