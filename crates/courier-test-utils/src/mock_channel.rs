// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat channel for deterministic testing.
//!
//! `MockChannel` implements `ChatChannel` with injectable inbound events and
//! captured outbound messages for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};

use courier_core::{
    AdapterType, ChatChannel, ConversationId, CourierError, HealthStatus, InboundEvent,
    PluginAdapter,
};

/// A mock chat channel for testing.
///
/// Provides two queues:
/// - **inbound**: events injected via `inject()` are returned by `receive()`
/// - **sent**: texts passed to `send()` are captured and retrievable via `sent()`
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    sent: Arc<Mutex<Vec<(ConversationId, String)>>>,
    notify: Arc<Notify>,
    closed: AtomicBool,
    fail_sends: AtomicBool,
    typing: AtomicUsize,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            closed: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            typing: AtomicUsize::new(0),
        }
    }

    /// Builds an event as the platform adapter would.
    pub fn event(conversation_id: &str, sender: &str, text: &str) -> InboundEvent {
        InboundEvent {
            conversation_id: ConversationId::new(conversation_id),
            sender: sender.to_string(),
            text: text.to_string(),
            received_at: Utc::now(),
        }
    }

    /// Queues an event for the next `receive()`.
    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Makes `receive()` fail once the queue is drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Makes every subsequent `send()` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<(ConversationId, String)> {
        self.sent.lock().await.clone()
    }

    /// Texts sent to one conversation, in order.
    pub async fn sent_to(&self, conversation_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(id, _)| id.as_str() == conversation_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        self.close();
        Ok(())
    }
}

#[async_trait]
impl ChatChannel for MockChannel {
    async fn connect(&mut self) -> Result<(), CourierError> {
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, CourierError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(CourierError::Channel {
                    message: "mock channel closed".into(),
                    source: None,
                });
            }
            self.notify.notified().await;
        }
    }

    async fn send(&self, conversation_id: &ConversationId, text: &str) -> Result<(), CourierError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(CourierError::Channel {
                message: "mock send failure".into(),
                source: None,
            });
        }
        self.sent
            .lock()
            .await
            .push((conversation_id.clone(), text.to_string()));
        Ok(())
    }

    async fn send_typing(&self, _conversation_id: &ConversationId) -> Result<(), CourierError> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
