//! Steam Promo Notifier — Binary Entrypoint
//! Boots the periodic check scheduler, the Telegram long-poll loop, and the
//! Axum HTTP status surface.

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use steam_promo_notifier::api::{self, AppState};
use steam_promo_notifier::bot::{self, BotContext};
use steam_promo_notifier::catalog::denylist::Denylist;
use steam_promo_notifier::catalog::providers::storefront::StorefrontProvider;
use steam_promo_notifier::catalog::types::CatalogProvider;
use steam_promo_notifier::checker::CheckStatus;
use steam_promo_notifier::config::AppConfig;
use steam_promo_notifier::ledger::NotificationLedger;
use steam_promo_notifier::metrics::Metrics;
use steam_promo_notifier::notify::telegram::TelegramClient;
use steam_promo_notifier::notify::Notifier;
use steam_promo_notifier::scheduler::{spawn_check_scheduler, CheckSchedulerCfg};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("steam_promo_notifier=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    // Missing TELEGRAM_TOKEN aborts here, before any loop starts.
    let cfg = AppConfig::from_env()?;

    let metrics = Metrics::init(cfg.check_interval_secs);

    let ledger = Arc::new(NotificationLedger::open(&cfg.store_path));
    let denylist = Arc::new(Denylist::load(cfg.denylist_path.as_deref()));
    let status = Arc::new(CheckStatus::default());
    let provider: Arc<dyn CatalogProvider> =
        Arc::new(StorefrontProvider::from_url(cfg.feed_url.clone()));
    let client = TelegramClient::new(cfg.telegram_token.clone());

    tracing::info!(
        recipients = ledger.recipient_count(),
        notified = ledger.notified_count(),
        denylist = denylist.len(),
        interval_secs = cfg.check_interval_secs,
        "starting steam promo notifier"
    );

    let notifier: Arc<dyn Notifier> = Arc::new(client.clone());
    let scheduler = spawn_check_scheduler(
        CheckSchedulerCfg {
            interval_secs: cfg.check_interval_secs,
        },
        provider.clone(),
        ledger.clone(),
        notifier,
        denylist.clone(),
        status.clone(),
    );

    let bot = tokio::spawn(bot::run_bot_loop(BotContext {
        client,
        provider,
        ledger: ledger.clone(),
        denylist,
        status: status.clone(),
    }));

    let router = api::create_router(AppState { ledger, status }).merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .context("bind http listener")?;
    tracing::info!(addr = %cfg.bind_addr, "http surface listening");

    tokio::select! {
        res = axum::serve(listener, router).into_future() => {
            res.context("http server")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    // Background loops hold no state that is not already persisted; stop them.
    scheduler.abort();
    bot.abort();
    Ok(())
}
