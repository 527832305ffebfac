// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending scheduled tasks.

use chrono::{DateTime, Utc};
use courier_core::{ConversationId, CourierError, ScheduledTask};
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{format_timestamp, parse_timestamp};

const SELECT_COLUMNS: &str =
    "SELECT conversation_id, task_key, prompt, due_at, created_at FROM tasks";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduledTask> {
    let due_at: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    Ok(ScheduledTask {
        conversation_id: ConversationId(row.get(0)?),
        key: row.get(1)?,
        prompt: row.get(2)?,
        due_at: parse_timestamp(3, &due_at)?,
        created_at: parse_timestamp(4, &created_at)?,
    })
}

/// Inserts a task. A duplicate key within the conversation is rejected.
pub async fn add(db: &Database, task: &ScheduledTask) -> Result<(), CourierError> {
    let task = task.clone();
    let conversation_id = task.conversation_id.clone();
    let key = task.key.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tasks (conversation_id, task_key, prompt, due_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(conversation_id, task_key) DO NOTHING",
                params![
                    task.conversation_id.as_str(),
                    task.key,
                    task.prompt,
                    format_timestamp(&task.due_at),
                    format_timestamp(&task.created_at)
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if inserted == 0 {
        return Err(CourierError::InvalidInput(format!(
            "conversation {conversation_id} already has a task '{key}'"
        )));
    }
    Ok(())
}

/// Every pending task, earliest due first.
pub async fn all(db: &Database) -> Result<Vec<ScheduledTask>, CourierError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY due_at ASC, conversation_id ASC, task_key ASC"
            ))?;
            let rows = stmt.query_map([], task_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn for_conversation(
    db: &Database,
    conversation_id: &ConversationId,
) -> Result<Vec<ScheduledTask>, CourierError> {
    let conversation_id = conversation_id.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE conversation_id = ?1 ORDER BY due_at ASC, task_key ASC"
            ))?;
            let rows = stmt.query_map(params![conversation_id.as_str()], task_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Tasks due at or before `now`.
///
/// Timestamps are stored as fixed-width RFC 3339 UTC strings, so text
/// comparison orders them chronologically.
pub async fn due(db: &Database, now: DateTime<Utc>) -> Result<Vec<ScheduledTask>, CourierError> {
    let cutoff = format_timestamp(&now);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE due_at <= ?1 ORDER BY due_at ASC, task_key ASC"
            ))?;
            let rows = stmt.query_map(params![cutoff], task_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn next_due(db: &Database) -> Result<Option<DateTime<Utc>>, CourierError> {
    let raw: Option<String> = db
        .connection()
        .call(|conn| conn.query_row("SELECT MIN(due_at) FROM tasks", [], |row| row.get(0)))
        .await
        .map_err(map_tr_err)?;
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| CourierError::Storage { source: Box::new(e) }),
        None => Ok(None),
    }
}

/// Deletes a task and returns what was deleted.
pub async fn remove(
    db: &Database,
    conversation_id: &ConversationId,
    key: &str,
) -> Result<Option<ScheduledTask>, CourierError> {
    let conversation_id = conversation_id.clone();
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let task = tx
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE conversation_id = ?1 AND task_key = ?2"),
                    params![conversation_id.as_str(), key],
                    task_from_row,
                )
                .optional()?;
            if task.is_some() {
                tx.execute(
                    "DELETE FROM tasks WHERE conversation_id = ?1 AND task_key = ?2",
                    params![conversation_id.as_str(), key],
                )?;
            }
            tx.commit()?;
            Ok(task)
        })
        .await
        .map_err(map_tr_err)
}
