// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full orchestration stack (task scheduler
//! included) with mock collaborators and a temp SQLite database. `send()` drives a message
//! through the real pipeline.

use std::sync::Arc;
use std::time::Duration;

use courier_agent::{
    AdminService, ConversationRegistry, InboundGateway, Pipeline, PipelineReply,
    PipelineSettings, RetryPolicy, TaskScheduler,
};
use courier_config::model::{PipelineConfig, StorageConfig};
use courier_core::{ConversationId, CourierError, Message, MessageStore, ModelReply, Role};
use courier_skill::{Tool, ToolRegistry};
use courier_storage::SqliteStore;

use crate::mock_channel::MockChannel;
use crate::mock_model::MockModel;
use crate::mock_tools::MockImageGenerator;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    model: MockModel,
    settings: PipelineSettings,
    tools: Vec<Arc<dyn Tool>>,
    images: Option<Arc<MockImageGenerator>>,
    page_size: u32,
    max_pending_tasks: Option<u32>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut settings =
            PipelineSettings::from_config(&PipelineConfig::default(), "You are a test assistant.");
        settings.lock_timeout = Duration::from_secs(10);
        settings.retry = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        };
        Self {
            model: MockModel::new(),
            settings,
            tools: Vec::new(),
            images: None,
            page_size: 50,
            max_pending_tasks: Some(20),
        }
    }

    /// Scripted model replies.
    pub fn with_replies(mut self, replies: Vec<ModelReply>) -> Self {
        self.model = MockModel::with_replies(replies);
        self
    }

    /// A preconfigured mock model (gated, delayed, custom fallback).
    pub fn with_model(mut self, model: MockModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_images(mut self, images: Arc<MockImageGenerator>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn with_max_tool_iterations(mut self, max: u32) -> Self {
        self.settings.max_tool_iterations = max;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.settings.lock_timeout = timeout;
        self
    }

    pub fn with_context_window(mut self, window: u32) -> Self {
        self.settings.context_window = window;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.settings.default_system_prompt = prompt.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_pending_tasks(mut self, max: u32) -> Self {
        self.max_pending_tasks = Some(max);
        self
    }

    /// Builds the pipeline without task tools.
    pub fn without_scheduler(mut self) -> Self {
        self.max_pending_tasks = None;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, CourierError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| CourierError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let store = Arc::new(SqliteStore::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        store.initialize().await?;

        let mut registry = ToolRegistry::new();
        for tool in self.tools {
            registry.register(tool);
        }

        let model = Arc::new(self.model);
        let conversations = Arc::new(ConversationRegistry::new());
        let mut pipeline = Pipeline::new(
            store.clone(),
            conversations.clone(),
            model.clone(),
            Arc::new(registry),
            self.settings,
        );
        if let Some(images) = &self.images {
            pipeline = pipeline.with_image_generator(images.clone());
        }
        let scheduler = self
            .max_pending_tasks
            .map(|max| Arc::new(TaskScheduler::new(store.clone(), max)));
        if let Some(scheduler) = &scheduler {
            pipeline = pipeline.with_scheduler(scheduler.clone());
        }
        let pipeline = Arc::new(pipeline);

        let channel = Arc::new(MockChannel::new());
        let admin = AdminService::new(pipeline.clone(), self.page_size).with_channel(channel.clone());

        Ok(TestHarness {
            store,
            registry: conversations,
            pipeline,
            model,
            channel,
            images: self.images,
            scheduler,
            admin,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock collaborators and temp storage.
pub struct TestHarness {
    /// SQLite store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteStore>,
    pub registry: Arc<ConversationRegistry>,
    pub pipeline: Arc<Pipeline>,
    pub model: Arc<MockModel>,
    pub channel: Arc<MockChannel>,
    pub images: Option<Arc<MockImageGenerator>>,
    pub scheduler: Option<Arc<TaskScheduler>>,
    pub admin: AdminService,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Submits `text` as a user message to `conversation_id`.
    pub async fn send(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<PipelineReply, CourierError> {
        self.pipeline
            .submit(&ConversationId::new(conversation_id), Role::User, text)
            .await
    }

    /// Every stored message of a conversation.
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<Message>, CourierError> {
        self.store
            .messages(&ConversationId::new(conversation_id))
            .await
    }

    /// An inbound gateway wired to the mock channel.
    pub fn gateway(&self) -> Arc<InboundGateway> {
        Arc::new(
            InboundGateway::new(self.channel.clone(), self.pipeline.clone(), self.admin.clone())
                .with_typing_interval(Duration::from_millis(20)),
        )
    }
}
