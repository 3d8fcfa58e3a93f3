use tracing::{debug, error, warn};

use dtb_core::{
    domain::ChatId,
    formatting::{help_html, render_report_html, QUERY_FAILED_MESSAGE},
};

use crate::router::AppState;

struct Command {
    name: String,
    /// Bot username from a `/cmd@botname` suffix.
    target: Option<String>,
    args: String,
}

impl Command {
    /// Unaddressed commands are for every bot in the chat; addressed ones only for `me`.
    fn is_for(&self, me: Option<&str>) -> bool {
        match (&self.target, me) {
            (None, _) => true,
            (Some(target), Some(me)) => target.eq_ignore_ascii_case(me),
            (Some(_), None) => false,
        }
    }
}

fn parse_command(text: &str) -> Command {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let args = parts.next().unwrap_or("").trim().to_string();

    let mut cmd = first.trim_start_matches('/').splitn(2, '@');
    let name = cmd.next().unwrap_or("").to_lowercase();
    let target = cmd.next().map(str::to_string);

    Command { name, target, args }
}

async fn send_html(state: &AppState, chat_id: ChatId, html: &str) {
    if let Err(e) = state.messenger.send_html(chat_id, html).await {
        warn!("failed to deliver reply to chat {}: {e}", chat_id.0);
    }
}

pub async fn handle_command(state: &AppState, chat_id: ChatId, text: &str) {
    let cmd = parse_command(text);
    if !cmd.is_for(state.bot_username.as_deref()) {
        debug!(
            "ignoring /{} addressed to @{}",
            cmd.name,
            cmd.target.as_deref().unwrap_or_default()
        );
        return;
    }
    if !cmd.args.is_empty() {
        debug!("/{} takes no arguments, ignoring {:?}", cmd.name, cmd.args);
    }

    match cmd.name.as_str() {
        "info" => handle_info(state, chat_id).await,
        "help" | "start" => send_html(state, chat_id, &help_html()).await,
        other => debug!("ignoring unknown command /{other}"),
    }
}

async fn handle_info(state: &AppState, chat_id: ChatId) {
    let ctx = state.call_context();
    match state
        .aggregator
        .build_report(&ctx, &state.cfg.instances)
        .await
    {
        Ok(report) => send_html(state, chat_id, &render_report_html(&report)).await,
        Err(e) => {
            error!("failed to build usage report: {e}");
            send_html(state, chat_id, QUERY_FAILED_MESSAGE).await;
        }
    }
}
