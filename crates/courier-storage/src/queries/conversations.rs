// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation records: system message and lifecycle.

use courier_core::{ConversationId, CourierError};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{format_timestamp, now};

/// The conversation's current system message, if one was set.
pub async fn system_message(
    db: &Database,
    conversation_id: &ConversationId,
) -> Result<Option<String>, CourierError> {
    let conversation_id = conversation_id.clone();
    let stored: Option<Option<String>> = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT system_message FROM conversations WHERE id = ?1",
                params![conversation_id.as_str()],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(stored.flatten())
}

/// Sets or replaces the system message, creating the conversation if needed.
pub async fn set_system_message(
    db: &Database,
    conversation_id: &ConversationId,
    content: &str,
) -> Result<(), CourierError> {
    let conversation_id = conversation_id.clone();
    let content = content.to_string();
    let stamp = format_timestamp(&now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations (id, system_message, next_message_id, created_at, updated_at)
                 VALUES (?1, ?2, 1, ?3, ?3)
                 ON CONFLICT(id) DO UPDATE SET system_message = excluded.system_message,
                                               updated_at = excluded.updated_at",
                params![conversation_id.as_str(), content, stamp],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Every known conversation id, most recently active first.
pub async fn ids(db: &Database) -> Result<Vec<ConversationId>, CourierError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id FROM conversations ORDER BY updated_at DESC, id ASC")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0).map(ConversationId))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Removes a conversation and its messages. Returns the number of messages removed.
pub async fn delete(db: &Database, conversation_id: &ConversationId) -> Result<u64, CourierError> {
    let key = conversation_id.clone();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let messages = tx.execute(
                "DELETE FROM messages WHERE conversation_id = ?1",
                params![key.as_str()],
            )?;
            let conversations =
                tx.execute("DELETE FROM conversations WHERE id = ?1", params![key.as_str()])?;
            tx.commit()?;
            Ok((conversations, messages))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        (0, _) => Err(CourierError::conversation_not_found(conversation_id.as_str())),
        (_, messages) => Ok(messages as u64),
    }
}
