// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation user profiles.

use courier_core::{ConversationId, CourierError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{format_timestamp, now};

pub async fn get(
    db: &Database,
    conversation_id: &ConversationId,
) -> Result<Option<String>, CourierError> {
    let conversation_id = conversation_id.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT profile FROM profiles WHERE conversation_id = ?1",
                params![conversation_id.as_str()],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Upserts the profile. Does not create a conversation record.
pub async fn set(
    db: &Database,
    conversation_id: &ConversationId,
    profile: &str,
) -> Result<(), CourierError> {
    let conversation_id = conversation_id.clone();
    let profile = profile.to_string();
    let stamp = format_timestamp(&now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO profiles (conversation_id, profile, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(conversation_id) DO UPDATE SET profile = excluded.profile,
                                                            updated_at = excluded.updated_at",
                params![conversation_id.as_str(), profile, stamp],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use courier_core::Role;
    use tempfile::tempdir;

    use super::*;
    use crate::queries::{conversations, messages};

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn set_replaces_previous_profile() {
        let (db, _dir) = setup_db().await;
        let c = ConversationId::from("7");
        assert_eq!(get(&db, &c).await.unwrap(), None);

        set(&db, &c, "Speaks Portuguese.").await.unwrap();
        set(&db, &c, "Speaks Portuguese. Nurse.").await.unwrap();
        assert_eq!(
            get(&db, &c).await.unwrap().as_deref(),
            Some("Speaks Portuguese. Nurse.")
        );
        // A profile alone does not make a conversation.
        assert!(conversations::ids(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn profile_survives_forgetting_the_conversation() {
        let (db, _dir) = setup_db().await;
        let c = ConversationId::from("8");
        messages::append(&db, &c, Role::User, "hello").await.unwrap();
        set(&db, &c, "Likes chess.").await.unwrap();

        conversations::delete(&db, &c).await.unwrap();
        assert_eq!(get(&db, &c).await.unwrap().as_deref(), Some("Likes chess."));
    }
}
