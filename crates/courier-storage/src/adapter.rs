// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`MessageStore`] and [`TaskStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use courier_config::model::StorageConfig;
use courier_core::{
    AdapterType, ConversationId, CourierError, HealthStatus, Message, MessageStore,
    PluginAdapter, Role, ScheduledTask, TaskStore,
};

use crate::database::{Database, map_tr_err};
use crate::queries::{conversations, messages, profiles, tasks};

/// SQLite-backed message store.
///
/// The database is opened by [`SqliteStore::initialize`]; every other call
/// fails with a storage error until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a store for the configured path without opening it.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, CourierError> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    /// Opens the database and applies migrations.
    pub async fn initialize(&self) -> Result<(), CourierError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| CourierError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, CourierError> {
        self.db.get().ok_or_else(|| CourierError::Storage {
            source: "storage not initialized, call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        self.db()?
            .connection()
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn append(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<Message, CourierError> {
        messages::append(self.db()?, conversation_id, role, content).await
    }

    async fn list(
        &self,
        conversation_id: &ConversationId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Message>, CourierError> {
        messages::list(self.db()?, conversation_id, page, page_size).await
    }

    async fn messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, CourierError> {
        messages::all(self.db()?, conversation_id).await
    }

    async fn update(
        &self,
        conversation_id: &ConversationId,
        message_id: i64,
        content: &str,
    ) -> Result<Message, CourierError> {
        messages::update(self.db()?, conversation_id, message_id, content).await
    }

    async fn delete(
        &self,
        conversation_id: &ConversationId,
        message_id: i64,
    ) -> Result<(), CourierError> {
        messages::delete(self.db()?, conversation_id, message_id).await
    }

    async fn history(
        &self,
        conversation_id: &ConversationId,
        max_messages: u32,
    ) -> Result<Vec<Message>, CourierError> {
        messages::history(self.db()?, conversation_id, max_messages).await
    }

    async fn system_message(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<String>, CourierError> {
        conversations::system_message(self.db()?, conversation_id).await
    }

    async fn set_system_message(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<(), CourierError> {
        conversations::set_system_message(self.db()?, conversation_id, content).await
    }

    async fn profile(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<String>, CourierError> {
        profiles::get(self.db()?, conversation_id).await
    }

    async fn set_profile(
        &self,
        conversation_id: &ConversationId,
        profile: &str,
    ) -> Result<(), CourierError> {
        profiles::set(self.db()?, conversation_id, profile).await
    }

    async fn conversation_ids(&self) -> Result<Vec<ConversationId>, CourierError> {
        conversations::ids(self.db()?).await
    }

    async fn delete_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<u64, CourierError> {
        conversations::delete(self.db()?, conversation_id).await
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn add_task(&self, task: &ScheduledTask) -> Result<(), CourierError> {
        tasks::add(self.db()?, task).await
    }

    async fn tasks(&self) -> Result<Vec<ScheduledTask>, CourierError> {
        tasks::all(self.db()?).await
    }

    async fn tasks_for(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ScheduledTask>, CourierError> {
        tasks::for_conversation(self.db()?, conversation_id).await
    }

    async fn due_tasks(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledTask>, CourierError> {
        tasks::due(self.db()?, now).await
    }

    async fn next_due(&self) -> Result<Option<DateTime<Utc>>, CourierError> {
        tasks::next_due(self.db()?).await
    }

    async fn remove_task(
        &self,
        conversation_id: &ConversationId,
        key: &str,
    ) -> Result<Option<ScheduledTask>, CourierError> {
        tasks::remove(self.db()?, conversation_id, key).await
    }
}
