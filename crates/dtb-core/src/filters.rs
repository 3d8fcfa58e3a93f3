//! Inbound update filters.
//!
//! The Telegram adapter converts each raw update into an [`InboundUpdate`] and runs it
//! through a [`FilterChain`]; only updates every predicate accepts reach the handlers.

use std::sync::Arc;

use tracing::{error, info};

use crate::domain::ChatId;

#[derive(Clone, Debug, Default)]
pub struct InboundUpdate {
    pub update_id: i64,
    pub message: Option<InboundMessage>,
}

#[derive(Clone, Debug, Default)]
pub struct InboundMessage {
    pub chat: Option<InboundChat>,
    pub sender: Option<Sender>,
    pub text: String,
    pub from_group: bool,
}

#[derive(Clone, Debug, Default)]
pub struct InboundChat {
    pub id: i64,
    pub username: Option<String>,
    pub title: Option<String>,
}

impl InboundChat {
    pub fn chat_id(&self) -> ChatId {
        ChatId(self.id)
    }

    /// String form used for the allow-list comparison (numeric chat id).
    pub fn recipient(&self) -> String {
        self.id.to_string()
    }

    /// True if `allowed` names this chat, either by numeric id or `@username`.
    pub fn matches_recipient(&self, allowed: &str) -> bool {
        let allowed = allowed.trim();
        if allowed == self.recipient() {
            return true;
        }
        match (&self.username, allowed.strip_prefix('@')) {
            (Some(name), Some(wanted)) => name.eq_ignore_ascii_case(wanted),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Sender {
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl Sender {
    /// `First Last (@username)`, skipping missing parts.
    pub fn display_name(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if !self.first_name.is_empty() {
            parts.push(self.first_name.clone());
        }
        if let Some(last) = self.last_name.as_deref().filter(|s| !s.is_empty()) {
            parts.push(last.to_string());
        }
        if let Some(user) = self.username.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("(@{user})"));
        }
        parts.join(" ")
    }
}

fn sender_name(sender: Option<&Sender>) -> String {
    sender.map(Sender::display_name).unwrap_or_default()
}

pub type Predicate = Arc<dyn Fn(&InboundUpdate) -> bool + Send + Sync>;

/// Ordered, short-circuiting list of predicates.
#[derive(Clone, Default)]
pub struct FilterChain {
    predicates: Vec<Predicate>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&InboundUpdate) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Arc::new(predicate));
        self
    }

    pub fn accepts(&self, update: &InboundUpdate) -> bool {
        self.predicates.iter().all(|p| p(update))
    }
}

/// Default chain used by the bot: log everything, then enforce the allowed recipient.
pub fn default_chain(allowed_recipient: impl Into<String>) -> FilterChain {
    FilterChain::new()
        .with(log_update)
        .with(filter_recipient(allowed_recipient))
}

/// Logs every update. Messages without a sender are dropped.
pub fn log_update(update: &InboundUpdate) -> bool {
    let Some(m) = &update.message else {
        info!("[Update updateID={}] non-message update", update.update_id);
        return true;
    };

    let Some(sender) = &m.sender else {
        error!("[Message updateID={}] sender is nil", update.update_id);
        return false;
    };

    info!(
        "[Message updateID={}] sender={}, fromGroup={}, recipient={}, content={}",
        update.update_id,
        sender.display_name(),
        m.from_group,
        m.chat.as_ref().map(InboundChat::recipient).unwrap_or_default(),
        m.text
    );
    true
}

/// Accepts only messages from the configured chat.
pub fn filter_recipient(
    allowed_recipient: impl Into<String>,
) -> impl Fn(&InboundUpdate) -> bool + Send + Sync + 'static {
    let allowed = allowed_recipient.into();
    move |update: &InboundUpdate| {
        let Some(m) = &update.message else {
            error!(
                "[Update updateID={}] non-message update, ignore",
                update.update_id
            );
            return false;
        };
        let Some(chat) = &m.chat else {
            error!("[Message updateID={}] chat is nil", update.update_id);
            return false;
        };
        if !chat.matches_recipient(&allowed) {
            error!(
                "[Message updateID={}] message from unallowed recipient {}, chatTitle={}, sender={}, ignore",
                update.update_id,
                chat.recipient(),
                chat.title.as_deref().unwrap_or(""),
                sender_name(m.sender.as_ref()),
            );
            return false;
        }
        true
    }
}
