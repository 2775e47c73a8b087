//! Macro-release watcher — binary entrypoint.
//! Boots the poll scheduler and the Axum ops surface, wiring shared state.

use anyhow::{Context, Result};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use macro_pulse::api::{self, AppState};
use macro_pulse::calendar::providers::TradingEconomicsProvider;
use macro_pulse::config::Config;
use macro_pulse::metrics;
use macro_pulse::notify::telegram::TelegramTransport;
use macro_pulse::notify::Broadcaster;
use macro_pulse::poll::{spawn_poll_scheduler, PollCfg};
use macro_pulse::store::{ProcessedStore, SubscriberStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("macro_pulse=info,poll=info,warn")),
        )
        .init();

    info!(
        country = %config.country,
        high_impact_only = config.high_impact_only,
        interval_secs = config.poll_interval_secs,
        "macro-pulse starting"
    );

    // Metrics recorder must be installed before any counter is touched.
    let metrics_router = metrics::install(config.poll_interval_secs);

    let processed = Arc::new(ProcessedStore::load(&config.state_dir).await);
    let subscribers = Arc::new(SubscriberStore::load(&config.state_dir).await);
    info!(
        processed = processed.len(),
        subscribers = subscribers.len(),
        "state loaded"
    );

    let provider = Arc::new(TradingEconomicsProvider::new(
        &config.te_base_url,
        &config.te_client,
        &config.country,
        config.high_impact_only,
        config.http_timeout_secs,
    )?);

    let transport = TelegramTransport::new(&config.telegram_api_base, &config.telegram_bot_token)
        .with_timeout(config.http_timeout_secs);
    let broadcaster = Arc::new(Broadcaster::new(transport));

    let last_poll_ts = Arc::new(AtomicU64::new(0));
    let _scheduler = spawn_poll_scheduler(
        PollCfg {
            interval_secs: config.poll_interval_secs,
            window_minutes: config.window_minutes,
        },
        provider,
        Arc::clone(&processed),
        Arc::clone(&subscribers),
        broadcaster,
        Arc::clone(&last_poll_ts),
    );

    let state = AppState {
        cfg: Arc::new(config.clone()),
        subscribers,
        processed,
        last_poll_ts,
    };
    let router = api::create_router(state).merge(metrics_router);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "ops surface listening");
    axum::serve(listener, router).await.context("serve")?;

    Ok(())
}
