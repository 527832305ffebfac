// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash commands answered without calling the model.

use chrono::Utc;
use courier_core::{ConversationId, CourierError};

use crate::admin::AdminService;
use crate::scheduler::describe_tasks;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Version,
    Time,
    Help,
    /// Replace the conversation's system message.
    System(String),
    /// Delete the conversation history.
    Forget,
    /// List this chat's scheduled tasks.
    Tasks,
    /// Cancel a scheduled task by key.
    Cancel(String),
    /// Show the profile, or replace it when text is given.
    Profile(String),
    Unknown(String),
}

pub const HELP_TEXT: &str = "Available commands:\n\
/version - show the bot version\n\
/time - show the current time\n\
/system <text> - set the system message for this chat\n\
/forget - delete this chat's history\n\
/tasks - list this chat's scheduled tasks\n\
/cancel <key> - cancel a scheduled task\n\
/profile [text] - show or replace what I know about you\n\
/help - show this message";

impl Command {
    /// Parses `text` if it starts with `/`. A `@botname` suffix on the
    /// command word is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let (word, args) = match rest.split_once(char::is_whitespace) {
            Some((word, args)) => (word, args.trim()),
            None => (rest, ""),
        };
        let name = word.split('@').next().unwrap_or(word).to_lowercase();

        Some(match name.as_str() {
            "version" => Self::Version,
            "time" => Self::Time,
            "help" | "start" => Self::Help,
            "system" => Self::System(args.to_string()),
            "forget" => Self::Forget,
            "tasks" => Self::Tasks,
            "cancel" => Self::Cancel(args.to_string()),
            "profile" => Self::Profile(args.to_string()),
            _ => Self::Unknown(name),
        })
    }

    /// Executes the command and returns the reply text.
    pub async fn execute(
        self,
        admin: &AdminService,
        conversation_id: &ConversationId,
    ) -> Result<String, CourierError> {
        match self {
            Self::Version => Ok(format!("courier {}", env!("CARGO_PKG_VERSION"))),
            Self::Time => Ok(Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            Self::Help => Ok(HELP_TEXT.to_string()),
            Self::System(text) if text.is_empty() => {
                Ok("Usage: /system <instructions for the assistant>".to_string())
            }
            Self::System(text) => {
                admin.set_system_message(conversation_id, &text).await?;
                Ok("System message updated.".to_string())
            }
            Self::Forget => match admin.delete_conversation(conversation_id).await {
                Ok(removed) => Ok(format!("Forgot {removed} messages.")),
                Err(CourierError::NotFound { .. }) => Ok("Nothing to forget.".to_string()),
                Err(e) => Err(e),
            },
            Self::Tasks => Ok(describe_tasks(
                &admin.conversation_tasks(conversation_id).await?,
            )),
            Self::Cancel(key) if key.is_empty() => Ok("Usage: /cancel <task key>".to_string()),
            Self::Cancel(key) => match admin.cancel_task(conversation_id, &key).await {
                Ok(task) => Ok(format!("Cancelled task {task}.")),
                Err(CourierError::NotFound { .. }) => Ok(format!("No pending task '{key}'.")),
                Err(e) => Err(e),
            },
            Self::Profile(text) if text.is_empty() => match admin.profile(conversation_id).await {
                Ok(profile) => Ok(profile),
                Err(CourierError::NotFound { .. }) => Ok("No profile set.".to_string()),
                Err(e) => Err(e),
            },
            Self::Profile(text) => {
                admin.set_profile(conversation_id, &text).await?;
                Ok("Profile updated.".to_string())
            }
            Self::Unknown(name) => Ok(format!("Unknown command /{name}. Try /help.")),
        }
    }
}
