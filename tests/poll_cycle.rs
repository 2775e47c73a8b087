//! End-to-end poll cycle against an in-memory provider and transport.

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;

use macro_pulse::calendar::{CalendarProvider, MacroEvent};
use macro_pulse::notify::{Broadcaster, ChatTransport};
use macro_pulse::poll::run_cycle;
use macro_pulse::store::{ProcessedStore, SubscriberStore};

struct FixtureProvider {
    events: Vec<MacroEvent>,
}

#[async_trait::async_trait]
impl CalendarProvider for FixtureProvider {
    async fn fetch_window(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<MacroEvent>> {
        Ok(self.events.clone())
    }
    fn name(&self) -> &'static str {
        "fixture"
    }
}

#[derive(Default)]
struct MemoryTransport {
    fail_all: bool,
    sent: Mutex<Vec<(i64, String)>>,
}

#[async_trait::async_trait]
impl ChatTransport for MemoryTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.fail_all {
            anyhow::bail!("transport down");
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}

fn released_event(name: &str, released_at: DateTime<Utc>) -> MacroEvent {
    MacroEvent {
        country: "United States".into(),
        name: name.into(),
        category: Some("Inflation Rate".into()),
        actual: Some("3.6%".into()),
        forecast: Some("3.2%".into()),
        previous: Some("3.4%".into()),
        unit: Some("%".into()),
        importance: Some(3),
        release_time_utc: released_at,
        raw_date: released_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        source: None,
        source_url: None,
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 7, 12, 31, 0).unwrap()
}

#[tokio::test]
async fn released_event_is_notified_once() {
    let dir = tempfile::tempdir().unwrap();
    let processed = ProcessedStore::load(dir.path()).await;
    let subscribers = SubscriberStore::load(dir.path()).await;
    subscribers.add(100).await.unwrap();
    subscribers.add(200).await.unwrap();

    let provider = FixtureProvider {
        events: vec![released_event("CPI YoY", now() - Duration::minutes(1))],
    };
    let broadcaster = Broadcaster::new(MemoryTransport::default());

    let r1 = run_cycle(&provider, &processed, &subscribers, &broadcaster, 6, now())
        .await
        .unwrap();
    assert_eq!(r1.fetched, 1);
    assert_eq!(r1.eligible, 1);
    assert_eq!(r1.notified, 1);
    assert_eq!(r1.delivered, 2);

    let sent = broadcaster.transport().sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, 100);
    assert!(sent[0].1.contains("United States — CPI YoY"));
    assert!(sent[0].1.contains("hawkish tilt"));

    // Second poll of the same window: dedup filter holds.
    let r2 = run_cycle(&provider, &processed, &subscribers, &broadcaster, 6, now())
        .await
        .unwrap();
    assert_eq!(r2.notified, 0);
    assert_eq!(r2.already_seen, 1);
    assert_eq!(broadcaster.transport().sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn pending_and_future_events_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let processed = ProcessedStore::load(dir.path()).await;
    let subscribers = SubscriberStore::load(dir.path()).await;
    subscribers.add(1).await.unwrap();

    let mut pending = released_event("GDP Growth Rate", now() - Duration::minutes(2));
    pending.actual = None; // scheduled but not yet published
    let future = released_event("FOMC Rate Decision", now() + Duration::minutes(30));

    let provider = FixtureProvider {
        events: vec![pending, future],
    };
    let broadcaster = Broadcaster::new(MemoryTransport::default());

    let report = run_cycle(&provider, &processed, &subscribers, &broadcaster, 6, now())
        .await
        .unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.eligible, 0);
    assert_eq!(report.notified, 0);
    assert!(broadcaster.transport().sent.lock().unwrap().is_empty());
    assert!(processed.is_empty());
}

#[tokio::test]
async fn no_subscribers_short_circuits_without_marking() {
    let dir = tempfile::tempdir().unwrap();
    let processed = ProcessedStore::load(dir.path()).await;
    let subscribers = SubscriberStore::load(dir.path()).await;

    let provider = FixtureProvider {
        events: vec![released_event("CPI YoY", now() - Duration::minutes(1))],
    };
    let broadcaster = Broadcaster::new(MemoryTransport::default());

    let report = run_cycle(&provider, &processed, &subscribers, &broadcaster, 6, now())
        .await
        .unwrap();
    assert_eq!(report.fetched, 1);
    assert_eq!(report.eligible, 0);
    // Nothing marked: the release is still fresh for the first subscriber.
    assert!(processed.is_empty());
}

#[tokio::test]
async fn failed_broadcast_leaves_release_unprocessed() {
    let dir = tempfile::tempdir().unwrap();
    let processed = ProcessedStore::load(dir.path()).await;
    let subscribers = SubscriberStore::load(dir.path()).await;
    subscribers.add(5).await.unwrap();

    let provider = FixtureProvider {
        events: vec![released_event("CPI YoY", now() - Duration::minutes(1))],
    };
    let down = Broadcaster::new(MemoryTransport {
        fail_all: true,
        ..Default::default()
    });

    let report = run_cycle(&provider, &processed, &subscribers, &down, 6, now())
        .await
        .unwrap();
    assert_eq!(report.eligible, 1);
    assert_eq!(report.notified, 0);
    assert_eq!(report.delivery_failures, 1);
    assert!(processed.is_empty());

    // Transport recovers: the same release goes out on the next tick.
    let up = Broadcaster::new(MemoryTransport::default());
    let retry = run_cycle(&provider, &processed, &subscribers, &up, 6, now())
        .await
        .unwrap();
    assert_eq!(retry.notified, 1);
    assert_eq!(up.transport().sent.lock().unwrap().len(), 1);
}
