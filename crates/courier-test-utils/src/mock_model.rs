// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model client for deterministic testing.
//!
//! `MockModel` implements `ModelClient` with a scripted queue of replies,
//! capturing every context it was called with. Calls can be held at a
//! [`ModelGate`] so tests can observe what happens while a run is in flight.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, Semaphore};

use courier_core::{
    AdapterType, CourierError, HealthStatus, ModelClient, ModelMessage, ModelReply,
    PluginAdapter, ToolCall, ToolDescriptor,
};

/// Holds gated model calls until opened.
#[derive(Clone)]
pub struct ModelGate {
    permits: Arc<Semaphore>,
    entered: Arc<Notify>,
}

impl ModelGate {
    fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(0)),
            entered: Arc::new(Notify::new()),
        }
    }

    /// Lets `n` held calls proceed.
    pub fn open(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Waits until a gated call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }
}

/// A mock model that returns scripted replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty the
/// fallback reply is returned (plain text "mock response" by default).
pub struct MockModel {
    script: Mutex<VecDeque<Result<ModelReply, CourierError>>>,
    fallback: ModelReply,
    contexts: Mutex<Vec<Vec<ModelMessage>>>,
    tools: Mutex<Vec<Vec<String>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    gate: Option<(ModelGate, Option<String>)>,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: ModelReply::Text("mock response".to_string()),
            contexts: Mutex::new(Vec::new()),
            tools: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
            gate: None,
        }
    }

    /// A model pre-loaded with `replies`.
    pub fn with_replies(replies: Vec<ModelReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().map(Ok).collect()),
            ..Self::new()
        }
    }

    /// Reply used once the script is exhausted.
    pub fn with_fallback(mut self, reply: ModelReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Sleeps before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Holds every call until the returned gate is opened.
    pub fn gated(mut self) -> (Self, ModelGate) {
        let gate = ModelGate::new();
        self.gate = Some((gate.clone(), None));
        (self, gate)
    }

    /// Holds only calls whose context mentions `marker`.
    pub fn gated_on(mut self, marker: impl Into<String>) -> (Self, ModelGate) {
        let gate = ModelGate::new();
        self.gate = Some((gate.clone(), Some(marker.into())));
        (self, gate)
    }

    pub async fn push_reply(&self, reply: ModelReply) {
        self.script.lock().await.push_back(Ok(reply));
    }

    pub async fn push_error(&self, error: CourierError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Number of `complete` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Contexts received, one per call.
    pub async fn contexts(&self) -> Vec<Vec<ModelMessage>> {
        self.contexts.lock().await.clone()
    }

    /// Tool names advertised, one list per call.
    pub async fn advertised_tools(&self) -> Vec<Vec<String>> {
        self.tools.lock().await.clone()
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for a reply requesting one tool call.
pub fn tool_call_reply(id: &str, name: &str, arguments: serde_json::Value) -> ModelReply {
    ModelReply::ToolCalls {
        text: None,
        calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
    }
}

#[async_trait]
impl PluginAdapter for MockModel {
    fn name(&self) -> &str {
        "mock-model"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Model
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl ModelClient for MockModel {
    async fn complete(
        &self,
        messages: &[ModelMessage],
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, CourierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().await.push(messages.to_vec());
        self.tools
            .lock()
            .await
            .push(tools.iter().map(|t| t.name.clone()).collect());

        if let Some((gate, marker)) = &self.gate {
            let applies = match marker {
                Some(marker) => messages.iter().any(|m| m.content.contains(marker.as_str())),
                None => true,
            };
            if applies {
                gate.entered.notify_one();
                if let Ok(permit) = gate.permits.acquire().await {
                    permit.forget();
                }
            }
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.script.lock().await.pop_front() {
            Some(reply) => reply,
            None => Ok(self.fallback.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use courier_core::Role;

    use super::*;

    fn context() -> Vec<ModelMessage> {
        vec![ModelMessage::new(Role::User, "hi")]
    }

    #[tokio::test]
    async fn scripted_replies_then_fallback() {
        let model = MockModel::with_replies(vec![ModelReply::Text("first".into())]);
        assert_eq!(
            model.complete(&context(), &[]).await.unwrap(),
            ModelReply::Text("first".into())
        );
        assert_eq!(
            model.complete(&context(), &[]).await.unwrap(),
            ModelReply::Text("mock response".into())
        );
        assert_eq!(model.call_count(), 2);
        assert_eq!(model.contexts().await.len(), 2);
    }

    #[tokio::test]
    async fn scripted_errors_are_returned() {
        let model = MockModel::new();
        model.push_error(CourierError::Protocol("bad".into())).await;
        assert!(model.complete(&context(), &[]).await.is_err());
    }

    #[tokio::test]
    async fn gate_holds_until_opened() {
        let (model, gate) = MockModel::new().gated();
        let model = Arc::new(model);
        let m = Arc::clone(&model);
        let call = tokio::spawn(async move { m.complete(&context(), &[]).await });

        gate.entered().await;
        assert!(!call.is_finished());
        gate.open(1);
        assert!(call.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn marker_gate_lets_other_calls_through() {
        let (model, _gate) = MockModel::new().gated_on("slow");
        let reply = tokio::time::timeout(Duration::from_secs(1), model.complete(&context(), &[]))
            .await
            .expect("ungated call must not block");
        assert!(reply.is_ok());
    }
}
