// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier history`: prints one page of a stored conversation.

use courier_config::CourierConfig;
use courier_core::{ConversationId, CourierError, Message, MessageStore};
use courier_storage::SqliteStore;

pub async fn run_history(
    config: &CourierConfig,
    conversation_id: &str,
    page: u32,
) -> Result<(), CourierError> {
    let store = SqliteStore::open(config.storage.clone()).await?;
    let id = ConversationId::new(conversation_id);
    for line in history_lines(&store, &id, page, config.admin.page_size).await? {
        println!("{line}");
    }
    Ok(())
}

/// Renders the system message (on the first page) and one page of messages.
pub async fn history_lines(
    store: &dyn MessageStore,
    conversation_id: &ConversationId,
    page: u32,
    page_size: u32,
) -> Result<Vec<String>, CourierError> {
    let mut lines = Vec::new();
    if page == 0
        && let Some(system) = store.system_message(conversation_id).await?
    {
        lines.push(format!("system message: {system}"));
    }

    let messages = store.list(conversation_id, page, page_size).await?;
    if messages.is_empty() {
        lines.push(format!(
            "no messages on page {page} of conversation {conversation_id}"
        ));
    }
    lines.extend(messages.iter().map(format_message));
    Ok(lines)
}

fn format_message(message: &Message) -> String {
    format!(
        "#{} {} {:>9}: {}",
        message.id,
        message.timestamp.format("%Y-%m-%d %H:%M:%S"),
        message.role.to_string(),
        message.content
    )
}
