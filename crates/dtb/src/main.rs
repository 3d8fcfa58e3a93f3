use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use dtb_core::{
    config::Config,
    context::CallContext,
    usage::{AccountApi, HostingApi, UsageAggregator},
};
use dtb_providers::{DlerCloudClient, VultrClient};

#[tokio::main]
async fn main() -> Result<(), dtb_core::Error> {
    dtb_core::logging::init("dtb")?;

    let cfg = Arc::new(Config::load()?);
    let shutdown = CancellationToken::new();

    let account = Arc::new(DlerCloudClient::new(
        &cfg.account_base_url,
        &cfg.account_email,
        &cfg.account_password,
        cfg.step_timeout,
    )?);

    // A failed startup login is fatal; there is no re-authentication path.
    let login_ctx = CallContext::with_token(shutdown.child_token(), cfg.step_timeout);
    if let Err(e) = account.login(&login_ctx).await {
        error!("failed to log in to Dler Cloud: {e}");
        return Err(e);
    }

    let hosting: Option<Arc<dyn HostingApi>> = match (cfg.hosting_enabled, &cfg.hosting_api_key) {
        (true, Some(key)) => Some(Arc::new(VultrClient::new(
            &cfg.hosting_base_url,
            key,
            cfg.step_timeout,
        )?)),
        _ => None,
    };

    let aggregator = UsageAggregator::new(account, hosting);
    info!("starting Telegram polling");

    dtb_telegram::router::run_polling(cfg, aggregator, shutdown)
        .await
        .map_err(|e| dtb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
