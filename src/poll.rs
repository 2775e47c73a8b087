//! The poll cycle and the interval scheduler around it.
//!
//! Control flow per tick: fetch the window → filter to released, unseen
//! events → interpret → broadcast → persist the dedup key. The scheduler is
//! a single tokio task, so at most one cycle is ever in flight; overdue
//! ticks coalesce instead of piling up.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::calendar::CalendarProvider;
use crate::interpret;
use crate::notify::{Broadcaster, ChatTransport};
use crate::store::{ProcessedStore, SubscriberStore};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("poll_runs_total", "Completed poll cycles.");
        describe_counter!(
            "poll_provider_errors_total",
            "Calendar fetch errors (cycle skipped)."
        );
        describe_counter!(
            "calendar_events_fetched_total",
            "Raw calendar rows returned by the provider."
        );
        describe_counter!(
            "releases_notified_total",
            "Releases broadcast to subscribers."
        );
        describe_counter!(
            "notify_delivery_failures_total",
            "Per-recipient delivery failures."
        );
        describe_histogram!("calendar_fetch_ms", "Provider fetch time in milliseconds.");
        describe_gauge!("poll_last_run_ts", "Unix ts when a poll cycle last completed.");
    });
}

#[derive(Clone, Copy, Debug)]
pub struct PollCfg {
    pub interval_secs: u64,
    pub window_minutes: i64,
}

/// What one cycle did, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    /// Released (actual present, not in the future) and not yet seen.
    pub eligible: usize,
    pub already_seen: usize,
    pub notified: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
}

/// Run one poll cycle at `now`.
///
/// With no subscribers the cycle stops before any dedup bookkeeping, so
/// releases are not burned before the first subscriber arrives. A release
/// is marked processed only after at least one delivery succeeded; a fully
/// failed broadcast leaves it for the next tick.
pub async fn run_cycle<P, T>(
    provider: &P,
    processed: &ProcessedStore,
    subscribers: &SubscriberStore,
    broadcaster: &Broadcaster<T>,
    window_minutes: i64,
    now: DateTime<Utc>,
) -> Result<CycleReport>
where
    P: CalendarProvider + ?Sized,
    T: ChatTransport,
{
    let start = now - Duration::minutes(window_minutes);
    let end = now + Duration::minutes(1);
    let events = provider.fetch_window(start, end).await?;

    let mut report = CycleReport {
        fetched: events.len(),
        ..Default::default()
    };

    let recipients = subscribers.snapshot();
    if recipients.is_empty() {
        tracing::debug!(fetched = report.fetched, "no subscribers, cycle is a no-op");
        return Ok(report);
    }

    for ev in &events {
        if !ev.is_released(now) {
            continue;
        }
        let key = ev.dedup_key();
        if processed.contains(&key) {
            report.already_seen += 1;
            continue;
        }
        report.eligible += 1;

        let analysis = interpret::interpret_event(ev);
        let msg = interpret::render_message(&analysis);
        let sent = broadcaster.broadcast(&recipients, &msg).await;
        report.delivered += sent.delivered;
        report.delivery_failures += sent.failed;

        if sent.any_delivered() {
            processed.insert(&key).await?;
            report.notified += 1;
            counter!("releases_notified_total").increment(1);
            tracing::info!(
                key = %key,
                direction = ?analysis.direction,
                delivered = sent.delivered,
                "release notified"
            );
        } else {
            tracing::warn!(key = %key, "all deliveries failed, will retry next tick");
        }
    }

    Ok(report)
}

/// Spawn the fixed-interval poll loop. Fetch errors are logged and the tick
/// is skipped; the loop itself never exits.
pub fn spawn_poll_scheduler<P, T>(
    cfg: PollCfg,
    provider: Arc<P>,
    processed: Arc<ProcessedStore>,
    subscribers: Arc<SubscriberStore>,
    broadcaster: Arc<Broadcaster<T>>,
    last_run_ts: Arc<AtomicU64>,
) -> JoinHandle<()>
where
    P: CalendarProvider + ?Sized + 'static,
    T: ChatTransport + 'static,
{
    ensure_metrics_described();
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let now = Utc::now();

            match run_cycle(
                provider.as_ref(),
                &processed,
                &subscribers,
                &broadcaster,
                cfg.window_minutes,
                now,
            )
            .await
            {
                Ok(report) => {
                    counter!("poll_runs_total").increment(1);
                    let ts = now.timestamp().max(0) as u64;
                    gauge!("poll_last_run_ts").set(ts as f64);
                    last_run_ts.store(ts, Ordering::Relaxed);
                    tracing::info!(
                        target: "poll",
                        fetched = report.fetched,
                        eligible = report.eligible,
                        notified = report.notified,
                        failures = report.delivery_failures,
                        "poll tick"
                    );
                }
                Err(e) => {
                    counter!("poll_provider_errors_total").increment(1);
                    tracing::warn!(error = ?e, provider = provider.name(), "poll tick failed");
                }
            }
        }
    })
}
