// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled tasks: prompts that run through the pipeline at a set time.
//!
//! Tasks are persisted in a [`TaskStore`] as soon as they are scheduled, so
//! they survive restarts. [`TaskScheduler::run`] sleeps until the earliest
//! task is due, claims it by removing it from the store, and submits its
//! prompt to the [`Pipeline`] like any other user message. The reply goes
//! out through the chat channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use courier_core::{
    ChatChannel, ConversationId, CourierError, Role, ScheduledTask, TaskStore, ToolCall,
    ToolDescriptor, ToolOutput,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::inbound::failure_message;
use crate::pipeline::Pipeline;

pub const SCHEDULE_TOOL_NAME: &str = "schedule_task";
pub const CANCEL_TOOL_NAME: &str = "cancel_task";
pub const LIST_TOOL_NAME: &str = "list_tasks";

/// Tasks overdue by more than this at startup are dropped instead of run.
pub const RECOVERY_GRACE: Duration = Duration::from_secs(60 * 60);

/// Upper bound on one sleep of the run loop.
const MAX_IDLE: Duration = Duration::from_secs(60);

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_KEY_LEN: usize = 40;

/// Owns the pending tasks and runs them when due.
pub struct TaskScheduler {
    store: Arc<dyn TaskStore>,
    max_pending: u32,
    wake: Notify,
    /// Serializes key allocation so two schedules never pick the same key.
    scheduling: Mutex<()>,
}

impl TaskScheduler {
    pub fn new(store: Arc<dyn TaskStore>, max_pending_per_conversation: u32) -> Self {
        Self {
            store,
            max_pending: max_pending_per_conversation.max(1),
            wake: Notify::new(),
            scheduling: Mutex::new(()),
        }
    }

    /// Persists a new task.
    ///
    /// Without an explicit `key` one is derived from the prompt, suffixed
    /// with `-2`, `-3`, ... when the conversation already uses it.
    pub async fn schedule(
        &self,
        conversation_id: &ConversationId,
        prompt: &str,
        due_at: DateTime<Utc>,
        key: Option<&str>,
    ) -> Result<ScheduledTask, CourierError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(CourierError::InvalidInput(
                "task prompt must not be empty".into(),
            ));
        }
        let now = Utc::now();
        if due_at <= now {
            return Err(CourierError::InvalidInput(format!(
                "cannot schedule a task in the past, the time now is {}",
                now.format("%Y-%m-%d %H:%M UTC")
            )));
        }
        if let Some(key) = key {
            validate_key(key)?;
        }

        let _guard = self.scheduling.lock().await;
        let existing = self.store.tasks_for(conversation_id).await?;
        if existing.len() >= self.max_pending as usize {
            return Err(CourierError::InvalidInput(format!(
                "conversation {conversation_id} already has {} pending tasks",
                existing.len()
            )));
        }
        let taken: Vec<&str> = existing.iter().map(|t| t.key.as_str()).collect();
        let key = match key {
            Some(key) => key.to_string(),
            None => unique_key(&slugify(prompt), &taken),
        };

        let task = ScheduledTask {
            key,
            conversation_id: conversation_id.clone(),
            prompt: prompt.to_string(),
            due_at: due_at.trunc_subsecs(3),
            created_at: now.trunc_subsecs(3),
        };
        self.store.add_task(&task).await?;
        info!(
            conversation_id = %conversation_id,
            key = task.key.as_str(),
            due_at = %task.due_at,
            "task scheduled"
        );
        self.wake.notify_one();
        Ok(task)
    }

    /// Removes a pending task. Unknown keys are `NotFound`.
    pub async fn cancel(
        &self,
        conversation_id: &ConversationId,
        key: &str,
    ) -> Result<ScheduledTask, CourierError> {
        let task = self
            .store
            .remove_task(conversation_id, key)
            .await?
            .ok_or_else(|| CourierError::NotFound {
                entity: "task",
                conversation_id: conversation_id.to_string(),
                message_id: None,
            })?;
        info!(conversation_id = %conversation_id, key, "task cancelled");
        self.wake.notify_one();
        Ok(task)
    }

    pub async fn tasks(&self) -> Result<Vec<ScheduledTask>, CourierError> {
        self.store.tasks().await
    }

    pub async fn tasks_for(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ScheduledTask>, CourierError> {
        self.store.tasks_for(conversation_id).await
    }

    /// Drops tasks that became due more than [`RECOVERY_GRACE`] before `now`.
    /// Returns how many were dropped. The rest run on the next tick.
    pub async fn recover(&self, now: DateTime<Utc>) -> Result<usize, CourierError> {
        let cutoff = now
            - chrono::Duration::from_std(RECOVERY_GRACE)
                .map_err(|e| CourierError::Internal(e.to_string()))?;
        let mut dropped = 0;
        for task in self.store.due_tasks(cutoff).await? {
            if self
                .store
                .remove_task(&task.conversation_id, &task.key)
                .await?
                .is_some()
            {
                warn!(
                    conversation_id = %task.conversation_id,
                    key = task.key.as_str(),
                    due_at = %task.due_at,
                    "dropping stale task"
                );
                dropped += 1;
            }
        }
        let pending = self.store.tasks().await?.len();
        info!(pending, dropped, "scheduled tasks recovered");
        Ok(dropped)
    }

    /// Runs due tasks until `cancel` fires, then waits for in-flight runs.
    pub async fn run(
        self: Arc<Self>,
        pipeline: Arc<Pipeline>,
        channel: Option<Arc<dyn ChatChannel>>,
        cancel: CancellationToken,
    ) -> Result<(), CourierError> {
        self.recover(Utc::now()).await?;
        let runs = TaskTracker::new();

        loop {
            let wait = match self.fire_due(&pipeline, &channel, &runs).await {
                // A failing store is retried after a full idle period.
                Err(e) => {
                    error!(error = %e, "failed to collect due tasks");
                    MAX_IDLE
                }
                Ok(_) => match self.store.next_due().await {
                    Ok(Some(due_at)) => (due_at - Utc::now()).to_std().unwrap_or(Duration::ZERO),
                    Ok(None) => MAX_IDLE,
                    Err(e) => {
                        error!(error = %e, "failed to read next due task");
                        MAX_IDLE
                    }
                },
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping task scheduler");
                    break;
                }
                _ = self.wake.notified() => debug!("task set changed"),
                _ = tokio::time::sleep(wait.min(MAX_IDLE)) => {}
            }
        }

        runs.close();
        if tokio::time::timeout(DRAIN_TIMEOUT, runs.wait()).await.is_err() {
            warn!(remaining = runs.len(), "timeout reached, some scheduled runs interrupted");
        }
        Ok(())
    }

    /// Claims every due task and starts its run on `runs`.
    async fn fire_due(
        &self,
        pipeline: &Arc<Pipeline>,
        channel: &Option<Arc<dyn ChatChannel>>,
        runs: &TaskTracker,
    ) -> Result<usize, CourierError> {
        let mut started = 0;
        for task in self.store.due_tasks(Utc::now()).await? {
            // Whoever removes the task owns the run.
            if self
                .store
                .remove_task(&task.conversation_id, &task.key)
                .await?
                .is_none()
            {
                continue;
            }
            let pipeline = Arc::clone(pipeline);
            let channel = channel.clone();
            runs.spawn(async move { execute(pipeline, channel, task).await });
            started += 1;
        }
        Ok(started)
    }

    /// Tool definitions for the model.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor {
                name: SCHEDULE_TOOL_NAME.to_string(),
                description: "Schedule a prompt to be run for this chat at a later time, \
                              for example a reminder. Times are UTC."
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "prompt": {
                            "type": "string",
                            "description": "What to do or say when the task runs"
                        },
                        "due_at": {
                            "type": "string",
                            "description": "When to run, as 'YYYY-MM-DD HH:MM' in UTC or RFC 3339"
                        },
                        "key": {
                            "type": "string",
                            "description": "Optional short name for the task"
                        }
                    },
                    "required": ["prompt", "due_at"]
                }),
            },
            ToolDescriptor {
                name: CANCEL_TOOL_NAME.to_string(),
                description: "Cancel a scheduled task of this chat by its key.".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "key": { "type": "string", "description": "Key of the task to cancel" }
                    },
                    "required": ["key"]
                }),
            },
            ToolDescriptor {
                name: LIST_TOOL_NAME.to_string(),
                description: "List the scheduled tasks of this chat.".into(),
                parameters: json!({ "type": "object", "properties": {} }),
            },
        ]
    }

    pub fn handles(name: &str) -> bool {
        matches!(name, SCHEDULE_TOOL_NAME | CANCEL_TOOL_NAME | LIST_TOOL_NAME)
    }

    /// Resolves a task tool call made in `conversation_id`.
    ///
    /// Caller mistakes come back as failure outputs for the model; storage
    /// errors abort the run.
    pub async fn invoke_tool(
        &self,
        conversation_id: &ConversationId,
        call: &ToolCall,
    ) -> Result<ToolOutput, CourierError> {
        let result = match call.name.as_str() {
            SCHEDULE_TOOL_NAME => self.schedule_from_tool(conversation_id, call).await,
            CANCEL_TOOL_NAME => match parse_args::<CancelArgs>(call) {
                Ok(args) => self
                    .cancel(conversation_id, &args.key)
                    .await
                    .map(|task| ToolOutput::success(format!("Cancelled task {task}."))),
                Err(output) => Ok(output),
            },
            LIST_TOOL_NAME => {
                let tasks = self.tasks_for(conversation_id).await?;
                Ok(ToolOutput::success(describe_tasks(&tasks)))
            }
            other => Ok(ToolOutput::failure(format!("unknown tool `{other}`"))),
        };

        match result {
            Err(CourierError::InvalidInput(reason)) => Ok(ToolOutput::failure(reason)),
            Err(CourierError::NotFound { .. }) => Ok(ToolOutput::failure(
                "No pending task with that key. Use list_tasks to see the keys.",
            )),
            other => other,
        }
    }

    async fn schedule_from_tool(
        &self,
        conversation_id: &ConversationId,
        call: &ToolCall,
    ) -> Result<ToolOutput, CourierError> {
        let args = match parse_args::<ScheduleArgs>(call) {
            Ok(args) => args,
            Err(output) => return Ok(output),
        };
        let due_at = parse_due_at(&args.due_at)?;
        let task = self
            .schedule(conversation_id, &args.prompt, due_at, args.key.as_deref())
            .await?;
        Ok(ToolOutput::success(format!("Scheduled task {task}.")))
    }
}

#[derive(Deserialize)]
struct ScheduleArgs {
    prompt: String,
    due_at: String,
    #[serde(default)]
    key: Option<String>,
}

#[derive(Deserialize)]
struct CancelArgs {
    key: String,
}

fn parse_args<T: for<'de> Deserialize<'de>>(call: &ToolCall) -> Result<T, ToolOutput> {
    serde_json::from_value(call.arguments.clone())
        .map_err(|e| ToolOutput::failure(format!("invalid arguments for {}: {e}", call.name)))
}

/// One line per task, or a note that there are none.
pub fn describe_tasks(tasks: &[ScheduledTask]) -> String {
    if tasks.is_empty() {
        return "No pending tasks.".to_string();
    }
    tasks
        .iter()
        .map(|t| format!("{t}: {}", t.prompt))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses a due time given as RFC 3339, `YYYY-MM-DD HH:MM` or
/// `YYYY.MM.DD HH:MM`. The last two are read as UTC.
pub fn parse_due_at(raw: &str) -> Result<DateTime<Utc>, CourierError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M", "%Y.%m.%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(CourierError::InvalidInput(format!(
        "`{raw}` is not a date and time, use YYYY-MM-DD HH:MM (UTC) or RFC 3339"
    )))
}

/// Stored form of a task's prompt when it runs.
pub fn trigger_content(task: &ScheduledTask) -> String {
    format!(
        "[{}] scheduled task '{}': {}",
        task.due_at.format("%Y-%m-%d %H:%M:%S"),
        task.key,
        task.prompt
    )
}

async fn execute(
    pipeline: Arc<Pipeline>,
    channel: Option<Arc<dyn ChatChannel>>,
    task: ScheduledTask,
) {
    let conversation_id = task.conversation_id.clone();
    info!(conversation_id = %conversation_id, key = task.key.as_str(), "running scheduled task");

    let texts = match pipeline
        .submit(&conversation_id, Role::User, &trigger_content(&task))
        .await
    {
        Ok(reply) => reply.messages.into_iter().map(|m| m.content).collect(),
        Err(e) => {
            error!(
                conversation_id = %conversation_id,
                key = task.key.as_str(),
                error = %e,
                "scheduled task failed"
            );
            vec![failure_message(&e)]
        }
    };

    let Some(channel) = channel else {
        return;
    };
    if conversation_id.as_str() == ConversationId::ANONYMOUS {
        return;
    }
    for text in texts.iter().filter(|t| !t.trim().is_empty()) {
        if let Err(e) = channel.send(&conversation_id, text).await {
            error!(conversation_id = %conversation_id, error = %e, "failed to deliver scheduled reply");
        }
    }
}

fn validate_key(key: &str) -> Result<(), CourierError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CourierError::InvalidInput(format!(
            "task key `{key}` must be 1-{MAX_KEY_LEN} letters, digits, '-' or '_'"
        )))
    }
}

/// Lowercase ASCII words of `prompt` joined by `-`, at most [`MAX_KEY_LEN`] long.
fn slugify(prompt: &str) -> String {
    let mut slug = String::new();
    for word in prompt
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_ascii_lowercase();
        let extra = if slug.is_empty() { word.len() } else { word.len() + 1 };
        if slug.len() + extra > MAX_KEY_LEN {
            break;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&word);
    }
    if slug.is_empty() {
        "task".to_string()
    } else {
        slug
    }
}

fn unique_key(base: &str, taken: &[&str]) -> String {
    if !taken.contains(&base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(&candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn due_at_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 5, 2, 18, 30, 0).unwrap();
        assert_eq!(parse_due_at("2026-05-02 18:30").unwrap(), expected);
        assert_eq!(parse_due_at("2026.05.02 18:30").unwrap(), expected);
        assert_eq!(parse_due_at("2026-05-02T18:30:00Z").unwrap(), expected);
        assert_eq!(parse_due_at(" 2026-05-02T20:30:00+02:00 ").unwrap(), expected);
        assert!(matches!(
            parse_due_at("tomorrow at noon"),
            Err(CourierError::InvalidInput(_))
        ));
    }

    #[test]
    fn keys_come_from_the_prompt() {
        assert_eq!(slugify("Remind me: water the plants!"), "remind-me-water-the-plants");
        assert_eq!(slugify("¿¿??"), "task");
        let long = slugify("one two three four five six seven eight nine ten eleven");
        assert!(long.len() <= MAX_KEY_LEN);
        assert!(!long.ends_with('-'));
    }

    #[test]
    fn keys_are_made_unique() {
        assert_eq!(unique_key("tea", &[]), "tea");
        assert_eq!(unique_key("tea", &["tea"]), "tea-2");
        assert_eq!(unique_key("tea", &["tea", "tea-2"]), "tea-3");
    }

    #[test]
    fn explicit_keys_are_url_safe() {
        assert!(validate_key("morning_standup-1").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key(&"x".repeat(MAX_KEY_LEN + 1)).is_err());
    }

    #[test]
    fn trigger_names_the_task() {
        let task = ScheduledTask {
            key: "tea".into(),
            conversation_id: "1".into(),
            prompt: "Tell me to make tea".into(),
            due_at: Utc.with_ymd_and_hms(2026, 5, 2, 16, 0, 0).unwrap(),
            created_at: Utc::now(),
        };
        assert_eq!(
            trigger_content(&task),
            "[2026-05-02 16:00:00] scheduled task 'tea': Tell me to make tea"
        );
        assert_eq!(
            describe_tasks(std::slice::from_ref(&task)),
            "'tea' scheduled for 2026-05-02 16:00 UTC: Tell me to make tea"
        );
        assert_eq!(describe_tasks(&[]), "No pending tasks.");
    }
}
