// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log operations.

use std::str::FromStr;

use courier_core::{ConversationId, CourierError, Message, Role};
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{format_timestamp, now, parse_timestamp};

const SELECT_COLUMNS: &str = "SELECT conversation_id, message_id, role, content, created_at FROM messages";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    let created_at: String = row.get(4)?;
    Ok(Message {
        conversation_id: ConversationId(row.get(0)?),
        id: row.get(1)?,
        role: Role::from_str(&role).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        content: row.get(3)?,
        timestamp: parse_timestamp(4, &created_at)?,
    })
}

/// Appends a message, allocating the next per-conversation id.
///
/// The conversation row is created on first use. Id allocation, the insert,
/// and the counter bump commit atomically.
pub async fn append(
    db: &Database,
    conversation_id: &ConversationId,
    role: Role,
    content: &str,
) -> Result<Message, CourierError> {
    let conversation_id = conversation_id.clone();
    let content = content.to_string();
    let timestamp = now();
    let stamp = format_timestamp(&timestamp);

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO conversations (id, next_message_id, created_at, updated_at)
                 VALUES (?1, 1, ?2, ?2)
                 ON CONFLICT(id) DO NOTHING",
                params![conversation_id.as_str(), stamp],
            )?;
            let id: i64 = tx.query_row(
                "SELECT next_message_id FROM conversations WHERE id = ?1",
                params![conversation_id.as_str()],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT INTO messages (conversation_id, message_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    conversation_id.as_str(),
                    id,
                    role.to_string(),
                    content,
                    stamp
                ],
            )?;
            tx.execute(
                "UPDATE conversations SET next_message_id = ?2, updated_at = ?3 WHERE id = ?1",
                params![conversation_id.as_str(), id + 1, stamp],
            )?;
            tx.commit()?;

            Ok(Message {
                id,
                conversation_id,
                role,
                content,
                timestamp,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// One page of messages, oldest first.
pub async fn list(
    db: &Database,
    conversation_id: &ConversationId,
    page: u32,
    page_size: u32,
) -> Result<Vec<Message>, CourierError> {
    let conversation_id = conversation_id.clone();
    let limit = i64::from(page_size);
    let offset = i64::from(page) * limit;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE conversation_id = ?1
                 ORDER BY message_id ASC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(
                params![conversation_id.as_str(), limit, offset],
                message_from_row,
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// The whole log of a conversation, oldest first.
pub async fn all(
    db: &Database,
    conversation_id: &ConversationId,
) -> Result<Vec<Message>, CourierError> {
    let conversation_id = conversation_id.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE conversation_id = ?1 ORDER BY message_id ASC"
            ))?;
            let rows = stmt.query_map(params![conversation_id.as_str()], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// The last `max_messages` messages in chronological order.
pub async fn history(
    db: &Database,
    conversation_id: &ConversationId,
    max_messages: u32,
) -> Result<Vec<Message>, CourierError> {
    let conversation_id = conversation_id.clone();
    let limit = i64::from(max_messages);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM ({SELECT_COLUMNS} WHERE conversation_id = ?1
                   ORDER BY message_id DESC LIMIT ?2)
                 ORDER BY message_id ASC"
            ))?;
            let rows =
                stmt.query_map(params![conversation_id.as_str(), limit], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Replaces the content of a message. Role and timestamp are untouched.
pub async fn update(
    db: &Database,
    conversation_id: &ConversationId,
    message_id: i64,
    content: &str,
) -> Result<Message, CourierError> {
    let key = conversation_id.clone();
    let content = content.to_string();
    let updated = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                "UPDATE messages SET content = ?3 WHERE conversation_id = ?1 AND message_id = ?2",
                params![key.as_str(), message_id, content],
            )?;
            let message = if changed == 0 {
                None
            } else {
                tx.execute(
                    "UPDATE conversations SET updated_at = ?2 WHERE id = ?1",
                    params![key.as_str(), format_timestamp(&now())],
                )?;
                tx.query_row(
                    &format!("{SELECT_COLUMNS} WHERE conversation_id = ?1 AND message_id = ?2"),
                    params![key.as_str(), message_id],
                    message_from_row,
                )
                .optional()?
            };
            tx.commit()?;
            Ok(message)
        })
        .await
        .map_err(map_tr_err)?;

    updated.ok_or_else(|| CourierError::message_not_found(conversation_id.as_str(), message_id))
}

/// Removes a single message. Remaining ids are not renumbered.
pub async fn delete(
    db: &Database,
    conversation_id: &ConversationId,
    message_id: i64,
) -> Result<(), CourierError> {
    let key = conversation_id.clone();
    let removed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM messages WHERE conversation_id = ?1 AND message_id = ?2",
                params![key.as_str(), message_id],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if removed == 0 {
        return Err(CourierError::message_not_found(
            conversation_id.as_str(),
            message_id,
        ));
    }
    Ok(())
}
