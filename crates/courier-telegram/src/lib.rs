// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram chat channel for Courier.
//!
//! Implements [`ChatChannel`] over the Telegram Bot API via teloxide:
//! long polling, sender authorization, MarkdownV2 replies with a plain-text
//! fallback, and typing indicators.

pub mod handler;
pub mod markdown;

use std::sync::Arc;

use async_trait::async_trait;
use courier_config::model::TelegramConfig;
use courier_core::{
    AdapterType, ChatChannel, ConversationId, CourierError, HealthStatus, InboundEvent,
    PluginAdapter,
};
use teloxide::dispatching::ShutdownToken;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, ParseMode};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

/// Bounded queue between the dispatcher and [`ChatChannel::receive`].
const INBOUND_QUEUE: usize = 100;

/// Telegram channel implementing [`ChatChannel`].
pub struct TelegramChannel {
    bot: Bot,
    allowed_users: Arc<Vec<String>>,
    inbound_rx: Mutex<mpsc::Receiver<InboundEvent>>,
    /// Moved into the dispatcher on connect, so `receive` fails once
    /// polling stops.
    inbound_tx: Option<mpsc::Sender<InboundEvent>>,
    shutdown_token: Option<ShutdownToken>,
}

impl TelegramChannel {
    /// Creates a channel. Requires a non-empty `bot_token`.
    pub fn new(config: TelegramConfig) -> Result<Self, CourierError> {
        let token = match config.bot_token.as_deref() {
            None => {
                return Err(CourierError::Config(
                    "telegram.bot_token is required for the Telegram channel".into(),
                ));
            }
            Some(t) if t.trim().is_empty() => {
                return Err(CourierError::Config(
                    "telegram.bot_token cannot be empty".into(),
                ));
            }
            Some(t) => t,
        };

        if config.allowed_users.is_empty() {
            warn!("telegram.allowed_users is empty, every message will be ignored");
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE);
        Ok(Self {
            bot: Bot::new(token),
            allowed_users: Arc::new(config.allowed_users),
            inbound_rx: Mutex::new(inbound_rx),
            inbound_tx: Some(inbound_tx),
            shutdown_token: None,
        })
    }

    fn chat_id(conversation_id: &ConversationId) -> Result<ChatId, CourierError> {
        conversation_id
            .as_str()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| CourierError::Channel {
                message: format!("invalid Telegram chat id '{conversation_id}': {e}"),
                source: None,
            })
    }

    async fn send_chunk(
        &self,
        chat_id: ChatId,
        text: &str,
        escaped: &str,
    ) -> Result<(), CourierError> {
        let formatted = self
            .bot
            .send_message(chat_id, escaped)
            .parse_mode(ParseMode::MarkdownV2)
            .await;

        if let Err(e) = formatted {
            warn!(error = %e, "MarkdownV2 send failed, retrying as plain text");
            self.bot
                .send_message(chat_id, text)
                .await
                .map_err(|e| CourierError::Channel {
                    message: format!("failed to send message: {e}"),
                    source: Some(Box::new(e)),
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        debug!("Telegram channel shutting down");
        if let Some(token) = &self.shutdown_token {
            match token.shutdown() {
                Ok(stopped) => stopped.await,
                Err(_) => debug!("dispatcher was not running"),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChatChannel for TelegramChannel {
    async fn connect(&mut self) -> Result<(), CourierError> {
        let Some(tx) = self.inbound_tx.take() else {
            return Ok(());
        };
        let allowed_users = Arc::clone(&self.allowed_users);

        let handler = Update::filter_message().endpoint(move |msg: Message| {
            let tx = tx.clone();
            let allowed = Arc::clone(&allowed_users);
            async move {
                if !handler::is_authorized(&msg, &allowed) {
                    debug!(chat_id = msg.chat.id.0, "ignoring unauthorized sender");
                    return respond(());
                }
                match handler::to_inbound_event(&msg) {
                    Some(event) => {
                        if tx.send(event).await.is_err() {
                            warn!("inbound queue closed, dropping message");
                        }
                    }
                    None => debug!(msg_id = msg.id.0, "ignoring non-text message"),
                }
                respond(())
            }
        });

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|_| async {})
            .build();
        self.shutdown_token = Some(dispatcher.shutdown_token());

        info!("starting Telegram long polling");
        tokio::spawn(async move {
            dispatcher.dispatch().await;
            info!("Telegram polling stopped");
        });
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, CourierError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| CourierError::Channel {
            message: "Telegram inbound queue closed".into(),
            source: None,
        })
    }

    async fn send(&self, conversation_id: &ConversationId, text: &str) -> Result<(), CourierError> {
        let chat_id = Self::chat_id(conversation_id)?;
        for (chunk, escaped) in markdown::escaped_chunks(text, markdown::MAX_MESSAGE_CHARS) {
            self.send_chunk(chat_id, &chunk, &escaped).await?;
        }
        Ok(())
    }

    async fn send_typing(&self, conversation_id: &ConversationId) -> Result<(), CourierError> {
        let chat_id = Self::chat_id(conversation_id)?;
        self.bot
            .send_chat_action(chat_id, ChatAction::Typing)
            .await
            .map_err(|e| CourierError::Channel {
                message: format!("failed to send typing indicator: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }
}
