use std::sync::Arc;

use teloxide::{
    dispatching::Dispatcher, dptree, error_handlers::LoggingErrorHandler, prelude::*,
    update_listeners::Polling,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dtb_core::{
    config::Config, context::CallContext, filters::FilterChain, messaging::port::MessagingPort,
    usage::UsageAggregator,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub aggregator: UsageAggregator,
    pub messenger: Arc<dyn MessagingPort>,
    pub filters: FilterChain,
    /// From `getMe`; `/cmd@name` commands for any other bot are ignored.
    pub bot_username: Option<String>,
    /// Cancelled when the dispatcher stops; every command's calls hang off it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Fresh per-command context: one step budget per outbound call.
    pub fn call_context(&self) -> CallContext {
        CallContext::with_token(self.shutdown.child_token(), self.cfg.step_timeout)
    }
}

pub async fn run_polling(
    cfg: Arc<Config>,
    aggregator: UsageAggregator,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let bot_username = match bot.get_me().await {
        Ok(me) => {
            info!("dtb started: @{}", me.username());
            Some(me.username().to_string())
        }
        Err(e) => {
            warn!("getMe failed, continuing; addressed commands will be ignored: {e}");
            None
        }
    };
    info!("Allowed recipient: {}", cfg.allowed_recipient);
    if aggregator.hosting_enabled() {
        info!("Vultr integration enabled ({} instances)", cfg.instances.len());
    } else {
        info!("Vultr integration disabled");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        aggregator,
        messenger,
        filters: dtb_core::filters::default_chain(cfg.allowed_recipient.clone()),
        bot_username,
        shutdown: shutdown.clone(),
    });

    // Every update (not only messages) goes through the filter chain.
    let handler = dptree::entry().endpoint(handlers::handle_update);

    let listener = Polling::builder(bot.clone())
        .timeout(cfg.poll_timeout)
        .build();

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build();
    dispatcher
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("update listener error"),
        )
        .await;

    shutdown.cancel();
    info!("dispatcher stopped");
    Ok(())
}
