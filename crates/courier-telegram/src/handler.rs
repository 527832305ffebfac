// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorization filtering and conversion of Telegram updates into
//! [`InboundEvent`]s.

use courier_core::{ConversationId, InboundEvent};
use teloxide::types::Message;

/// Checks whether the message sender is authorized.
///
/// Passes if the sender's numeric id or username (with or without `@`,
/// case-insensitive) is listed. An empty list rejects everyone, as do
/// messages without a sender.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    let user_id = user.id.0.to_string();

    allowed_users.iter().any(|allowed| {
        if *allowed == user_id {
            return true;
        }
        let allowed = allowed.strip_prefix('@').unwrap_or(allowed);
        user.username
            .as_deref()
            .is_some_and(|username| username.eq_ignore_ascii_case(allowed))
    })
}

/// Display name used to prefix stored messages: the username if set,
/// otherwise the first name.
pub fn sender_name(msg: &Message) -> String {
    match msg.from.as_ref() {
        Some(user) => user
            .username
            .clone()
            .unwrap_or_else(|| user.first_name.clone()),
        None => "unknown".to_string(),
    }
}

/// Converts a text message into an inbound event. Non-text messages
/// (stickers, photos without a caption, service messages) yield `None`.
pub fn to_inbound_event(msg: &Message) -> Option<InboundEvent> {
    let text = msg.text().or_else(|| msg.caption())?;
    if text.trim().is_empty() {
        return None;
    }

    Some(InboundEvent {
        conversation_id: ConversationId::new(msg.chat.id.0.to_string()),
        sender: sender_name(msg),
        text: text.to_string(),
        received_at: msg.date,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn message(chat: serde_json::Value, from: Option<serde_json::Value>, text: &str) -> Message {
        let mut json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": chat,
            "text": text,
        });
        if let Some(from) = from {
            json["from"] = from;
        }
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn private(user_id: u64, username: Option<&str>, text: &str) -> Message {
        let mut from = serde_json::json!({
            "id": user_id,
            "is_bot": false,
            "first_name": "Test",
        });
        if let Some(username) = username {
            from["username"] = username.into();
        }
        let chat = serde_json::json!({
            "id": user_id as i64,
            "type": "private",
            "first_name": "Test",
        });
        message(chat, Some(from), text)
    }

    fn group(user_id: u64, text: &str) -> Message {
        let chat = serde_json::json!({
            "id": -100123i64,
            "type": "supergroup",
            "title": "Team",
        });
        let from = serde_json::json!({
            "id": user_id,
            "is_bot": false,
            "first_name": "Grace",
        });
        message(chat, Some(from), text)
    }

    #[test]
    fn authorized_by_id_or_username() {
        let msg = private(12345, Some("TestUser"), "hello");
        assert!(is_authorized(&msg, &["12345".into()]));
        assert!(is_authorized(&msg, &["testuser".into()]));
        assert!(is_authorized(&msg, &["@testuser".into()]));
    }

    #[test]
    fn unauthorized_cases() {
        let msg = private(12345, Some("testuser"), "hello");
        assert!(!is_authorized(&msg, &["99999".into()]));
        assert!(!is_authorized(&msg, &[]));

        let chat = serde_json::json!({"id": 1i64, "type": "private", "first_name": "X"});
        let anonymous = message(chat, None, "hello");
        assert!(!is_authorized(&anonymous, &["1".into()]));
    }

    #[test]
    fn sender_prefers_username() {
        assert_eq!(sender_name(&private(1, Some("alice"), "hi")), "alice");
        assert_eq!(sender_name(&private(1, None, "hi")), "Test");
    }

    #[test]
    fn group_message_maps_to_chat_conversation() {
        let event = to_inbound_event(&group(7, "morning all")).unwrap();
        assert_eq!(event.conversation_id, ConversationId::new("-100123"));
        assert_eq!(event.sender, "Grace");
        assert_eq!(event.text, "morning all");
        assert_eq!(event.received_at, Utc.timestamp_opt(1700000000, 0).unwrap());
    }

    #[test]
    fn blank_text_is_ignored() {
        assert!(to_inbound_event(&private(1, None, "   ")).is_none());
    }
}
