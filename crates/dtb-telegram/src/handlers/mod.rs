//! Telegram update handlers.
//!
//! Each update is converted into a transport-agnostic `InboundUpdate`, run through the
//! filter chain, and only then dispatched to a command handler.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{Message, UpdateKind},
};

use dtb_core::filters::{InboundChat, InboundMessage, InboundUpdate, Sender};

use crate::router::AppState;

mod commands;

pub async fn handle_update(update: Update, state: Arc<AppState>) -> ResponseResult<()> {
    let inbound = to_inbound(&update);
    if !state.filters.accepts(&inbound) {
        return Ok(());
    }

    let Some(m) = inbound.message else {
        return Ok(());
    };
    let Some(chat) = m.chat else {
        return Ok(());
    };

    if m.text.starts_with('/') {
        commands::handle_command(&state, chat.chat_id(), &m.text).await;
    }

    Ok(())
}

fn to_inbound(update: &Update) -> InboundUpdate {
    let message = match &update.kind {
        UpdateKind::Message(m) => Some(to_inbound_message(m)),
        _ => None,
    };
    InboundUpdate {
        update_id: i64::from(update.id),
        message,
    }
}

fn to_inbound_message(m: &Message) -> InboundMessage {
    InboundMessage {
        chat: Some(InboundChat {
            id: m.chat.id.0,
            username: m.chat.username().map(str::to_string),
            title: m.chat.title().map(str::to_string),
        }),
        sender: m.from().map(|u| Sender {
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            username: u.username.clone(),
        }),
        text: m.text().unwrap_or_default().to_string(),
        from_group: m.chat.is_group() || m.chat.is_supergroup(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn message_without_sender_converts_and_is_dropped_by_default_chain() {
        let upd = update(
            r#"{"update_id":7,"message":{"message_id":5,"date":1710000000,
                "chat":{"id":-1001,"type":"supergroup","title":"ops"},
                "sender_chat":{"id":-1001,"type":"supergroup","title":"ops"},
                "text":"/info"}}"#,
        );

        let inbound = to_inbound(&upd);
        assert_eq!(inbound.update_id, 7);
        let m = inbound.message.as_ref().unwrap();
        assert!(m.sender.is_none());
        assert!(m.from_group);
        assert_eq!(m.text, "/info");
        let chat = m.chat.as_ref().unwrap();
        assert_eq!(chat.id, -1001);
        assert_eq!(chat.title.as_deref(), Some("ops"));

        assert!(!dtb_core::filters::default_chain("-1001").accepts(&inbound));
    }

    #[test]
    fn private_message_carries_sender_and_username() {
        let upd = update(
            r#"{"update_id":8,"message":{"message_id":6,"date":1710000000,
                "chat":{"id":42,"type":"private","first_name":"Alice","username":"alice"},
                "from":{"id":42,"is_bot":false,"first_name":"Alice","username":"alice"},
                "text":"/help"}}"#,
        );

        let inbound = to_inbound(&upd);
        let m = inbound.message.as_ref().unwrap();
        assert!(!m.from_group);
        assert_eq!(m.sender.as_ref().unwrap().first_name, "Alice");
        assert_eq!(m.chat.as_ref().unwrap().username.as_deref(), Some("alice"));
        assert!(dtb_core::filters::default_chain("@alice").accepts(&inbound));
    }

    #[test]
    fn non_message_updates_have_no_message() {
        let upd = update(
            r#"{"update_id":9,"edited_message":{"message_id":6,"date":1710000000,
                "edit_date":1710000100,
                "chat":{"id":42,"type":"private","first_name":"Alice"},
                "from":{"id":42,"is_bot":false,"first_name":"Alice"},
                "text":"/info"}}"#,
        );

        assert!(to_inbound(&upd).message.is_none());
    }
}
