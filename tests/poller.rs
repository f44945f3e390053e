//! Behavioral tests for the polling subsystem, driven by scripted feed
//! sources under tokio's paused clock.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use compact_str::CompactString;
use gowalla_client::{
    ClientError, EventCallback, FeedSource, PollRegistry, PollTarget,
    client::PollingConfig,
    domain::ActivityDto,
    event::PollEvent,
};
use tokio::{
    sync::{Notify, mpsc},
    time::timeout,
};

const INTERVAL: Duration = Duration::from_secs(30);

fn event_at(ts: &str) -> ActivityDto {
    ActivityDto {
        created_at: ts.into(),
        kind: "checkin".into(),
        ..Default::default()
    }
}

fn seed() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Feed source that replays a script, then empty pages forever.
struct ScriptedFeed {
    pages: Mutex<VecDeque<gowalla_client::Result<Vec<ActivityDto>>>>,
}

impl ScriptedFeed {
    fn new(pages: Vec<gowalla_client::Result<Vec<ActivityDto>>>) -> Arc<Self> {
        Arc::new(Self { pages: Mutex::new(pages.into()) })
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch_feed(&self, _target: &PollTarget) -> gowalla_client::Result<Vec<ActivityDto>> {
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Feed source that blocks until released, for in-flight cancellation tests.
struct GatedFeed {
    gate: Arc<Notify>,
    page: Vec<ActivityDto>,
}

#[async_trait]
impl FeedSource for GatedFeed {
    async fn fetch_feed(&self, _target: &PollTarget) -> gowalla_client::Result<Vec<ActivityDto>> {
        self.gate.notified().await;
        Ok(self.page.clone())
    }
}

fn collecting_callback() -> (EventCallback, Arc<Mutex<Vec<CompactString>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let inner = Arc::clone(&seen);
    let callback: EventCallback = Arc::new(move |event: &ActivityDto| {
        inner.lock().unwrap().push(event.created_at.clone());
        Ok(())
    });
    (callback, seen)
}

async fn recv_event(rx: &mut mpsc::UnboundedReceiver<PollEvent>) -> PollEvent {
    timeout(Duration::from_secs(600), rx.recv())
        .await
        .expect("timed out waiting for poll event")
        .expect("event channel closed")
}

/// Receive the next notification that is not a plain tick marker.
async fn recv_non_tick(rx: &mut mpsc::UnboundedReceiver<PollEvent>) -> PollEvent {
    loop {
        match recv_event(rx).await {
            PollEvent::TickStarted(_) => continue,
            other => return other,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn delivers_new_events_oldest_first_and_advances_cursor() {
    let feed = ScriptedFeed::new(vec![
        Ok(vec![
            event_at("2024-01-01T00:10:00Z"),
            event_at("2024-01-01T00:05:00Z"),
            event_at("2023-12-31T23:55:00Z"),
        ]),
        // Second tick: empty page, no delivery, cursor untouched
        Ok(Vec::new()),
        // Third tick: same newest event again, nothing newer than cursor
        Ok(vec![event_at("2024-01-01T00:10:00Z")]),
    ]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);
    let (callback, seen) = collecting_callback();

    let id = registry
        .add(PollTarget::spot("11888"), Some(INTERVAL), Some(seed()), callback)
        .unwrap();

    assert!(matches!(recv_event(&mut rx).await, PollEvent::SubscriptionAdded(added, _) if added == id));
    assert!(matches!(recv_event(&mut rx).await, PollEvent::TickStarted(_)));
    assert!(matches!(
        recv_event(&mut rx).await,
        PollEvent::EventDelivered(_, e) if e.created_at == "2024-01-01T00:05:00Z"
    ));
    assert!(matches!(
        recv_event(&mut rx).await,
        PollEvent::EventDelivered(_, e) if e.created_at == "2024-01-01T00:10:00Z"
    ));

    // Ticks two and three produce no deliveries
    assert!(matches!(recv_event(&mut rx).await, PollEvent::TickStarted(_)));
    assert!(matches!(recv_event(&mut rx).await, PollEvent::TickStarted(_)));
    assert!(matches!(recv_event(&mut rx).await, PollEvent::TickStarted(_)));

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["2024-01-01T00:05:00Z", "2024-01-01T00:10:00Z"]
    );
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_is_reported_and_retried_from_same_cursor() {
    let feed = ScriptedFeed::new(vec![
        Err(ClientError::api("HTTP 500: boom")),
        Ok(vec![event_at("2024-01-01T00:05:00Z")]),
    ]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);
    let (callback, seen) = collecting_callback();

    registry
        .add(PollTarget::spot("11888"), Some(INTERVAL), Some(seed()), callback)
        .unwrap();

    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::SubscriptionAdded(_, _)
    ));
    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::FetchFailed(_, reason) if reason.contains("boom")
    ));

    // Cursor was left at the seed, so the retry still sees the event as new
    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::EventDelivered(_, e) if e.created_at == "2024-01-01T00:05:00Z"
    ));
    assert_eq!(*seen.lock().unwrap(), vec!["2024-01-01T00:05:00Z"]);
}

#[tokio::test(start_paused = true)]
async fn callback_error_does_not_block_later_deliveries() {
    let page = vec![
        event_at("2024-01-01T00:10:00Z"),
        event_at("2024-01-01T00:05:00Z"),
    ];
    // Second tick replays the same page; the cursor advanced past both
    // events on the first tick even though one delivery failed
    let feed = ScriptedFeed::new(vec![Ok(page.clone()), Ok(page)]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let inner = Arc::clone(&seen);
    let callback: EventCallback = Arc::new(move |event: &ActivityDto| {
        inner.lock().unwrap().push(event.created_at.clone());
        if event.created_at == "2024-01-01T00:05:00Z" {
            Err("observer rejected event".into())
        } else {
            Ok(())
        }
    });

    registry
        .add(PollTarget::spot("11888"), Some(INTERVAL), Some(seed()), callback)
        .unwrap();

    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::SubscriptionAdded(_, _)
    ));
    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::CallbackFailed(_, reason) if reason.contains("rejected")
    ));
    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::EventDelivered(_, e) if e.created_at == "2024-01-01T00:10:00Z"
    ));

    // Tick two re-fetches the same page; nothing is newer than the
    // cursor, so neither event is redelivered
    assert!(matches!(recv_event(&mut rx).await, PollEvent::TickStarted(_)));
    assert!(matches!(recv_event(&mut rx).await, PollEvent::TickStarted(_)));

    // Each event reached the observer exactly once, the failed one included
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["2024-01-01T00:05:00Z", "2024-01-01T00:10:00Z"]
    );
}

#[tokio::test(start_paused = true)]
async fn remove_during_in_flight_fetch_discards_the_result() {
    let gate = Arc::new(Notify::new());
    let feed = Arc::new(GatedFeed {
        gate: Arc::clone(&gate),
        page: vec![event_at("2024-01-01T00:10:00Z")],
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);
    let (callback, seen) = collecting_callback();

    let id = registry
        .add(PollTarget::spot("11888"), Some(INTERVAL), Some(seed()), callback)
        .unwrap();

    assert!(matches!(recv_event(&mut rx).await, PollEvent::SubscriptionAdded(_, _)));
    assert!(matches!(recv_event(&mut rx).await, PollEvent::TickStarted(_)));

    // The fetch is now parked on the gate; cancel before releasing it
    assert!(registry.remove(id));
    assert!(matches!(recv_event(&mut rx).await, PollEvent::SubscriptionRemoved(removed) if removed == id));
    gate.notify_one();

    // No delivery may surface once the subscription is gone
    assert!(timeout(Duration::from_secs(300), rx.recv()).await.is_err());
    assert!(seen.lock().unwrap().is_empty());
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn remove_is_idempotent_and_stops_deliveries() {
    let feed = ScriptedFeed::new(vec![]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);
    let (callback, _seen) = collecting_callback();

    let id = registry
        .add(PollTarget::spot("11888"), Some(INTERVAL), Some(seed()), callback)
        .unwrap();
    assert!(matches!(recv_event(&mut rx).await, PollEvent::SubscriptionAdded(_, _)));

    assert!(registry.remove(id));
    assert!(matches!(recv_event(&mut rx).await, PollEvent::SubscriptionRemoved(_)));

    // Second remove is a no-op with a diagnostic, not an error
    assert!(!registry.remove(id));
    assert!(matches!(recv_event(&mut rx).await, PollEvent::SubscriptionNotFound(not_found) if not_found == id));

    // The worker is inert: no ticks fire after removal
    assert!(timeout(Duration::from_secs(300), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn remove_unknown_id_on_empty_registry_is_non_fatal() {
    let feed = ScriptedFeed::new(vec![]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);

    let unknown = gowalla_client::SubscriptionId::new(999);
    assert!(!registry.remove(unknown));
    assert!(matches!(
        recv_event(&mut rx).await,
        PollEvent::SubscriptionNotFound(id) if id == unknown
    ));
}

#[tokio::test(start_paused = true)]
async fn duplicate_targets_poll_independently() {
    let feed = ScriptedFeed::new(vec![]);
    let (tx, _rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);
    let (callback, _) = collecting_callback();

    let first = registry
        .add(
            PollTarget::spot("11888"),
            Some(INTERVAL),
            Some(seed()),
            Arc::clone(&callback),
        )
        .unwrap();
    let second = registry
        .add(PollTarget::spot("11888"), Some(INTERVAL), Some(seed()), callback)
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(registry.len(), 2);
    assert!(registry.contains(first));
    assert!(registry.contains(second));
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_rejected() {
    let feed = ScriptedFeed::new(vec![]);
    let (tx, _rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);
    let (callback, _) = collecting_callback();

    let result = registry.add(
        PollTarget::spot("11888"),
        Some(Duration::ZERO),
        Some(seed()),
        callback,
    );
    assert!(matches!(result, Err(ClientError::InvalidInterval(_))));
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn compact_offset_timestamps_flow_through_delivery() {
    let feed = ScriptedFeed::new(vec![Ok(vec![
        event_at("Sat, 25 Dec 2010 18:30:00+0000"),
        event_at("Sat, 25 Dec 2010 18:10:00+0000"),
    ])]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);
    let (callback, seen) = collecting_callback();

    let cursor_seed = Utc.with_ymd_and_hms(2010, 12, 25, 18, 0, 0).unwrap();
    registry
        .add(
            PollTarget::friend_activity("jspies"),
            Some(INTERVAL),
            Some(cursor_seed),
            callback,
        )
        .unwrap();

    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::SubscriptionAdded(_, _)
    ));
    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::EventDelivered(_, e) if e.created_at == "Sat, 25 Dec 2010 18:10:00+0000"
    ));
    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::EventDelivered(_, e) if e.created_at == "Sat, 25 Dec 2010 18:30:00+0000"
    ));
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_every_subscription() {
    let feed = ScriptedFeed::new(vec![]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);
    let (callback, _) = collecting_callback();

    registry
        .add(
            PollTarget::spot("1"),
            Some(INTERVAL),
            Some(seed()),
            Arc::clone(&callback),
        )
        .unwrap();
    registry
        .add(PollTarget::spot("2"), Some(INTERVAL), Some(seed()), callback)
        .unwrap();
    assert_eq!(registry.len(), 2);

    registry.shutdown();
    assert!(registry.is_empty());

    let mut removed = 0;
    while removed < 2 {
        if let PollEvent::SubscriptionRemoved(_) = recv_non_tick(&mut rx).await {
            removed += 1;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_fetch_times_out_and_is_retried() {
    // The gate is never released, so every fetch hangs until the deadline
    let feed = Arc::new(GatedFeed {
        gate: Arc::new(Notify::new()),
        page: Vec::new(),
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx);
    let (callback, seen) = collecting_callback();

    registry
        .add(PollTarget::spot("11888"), Some(INTERVAL), Some(seed()), callback)
        .unwrap();

    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::SubscriptionAdded(_, _)
    ));
    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::FetchFailed(_, reason) if reason.contains("timed out")
    ));

    // The worker survives the timeout and keeps ticking
    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::FetchFailed(_, reason) if reason.contains("timed out")
    ));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_interval_falls_back_to_polling_config() {
    let feed = ScriptedFeed::new(vec![Ok(vec![event_at("2024-01-01T00:05:00Z")])]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = PollRegistry::new(feed, tx)
        .with_polling(PollingConfig { interval: Duration::from_secs(5) });
    let (callback, seen) = collecting_callback();

    registry
        .add(PollTarget::spot("11888"), None, Some(seed()), callback)
        .unwrap();

    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::SubscriptionAdded(_, _)
    ));

    // The configured default drives the timer: a tick fires and delivers
    assert!(matches!(
        recv_non_tick(&mut rx).await,
        PollEvent::EventDelivered(_, e) if e.created_at == "2024-01-01T00:05:00Z"
    ));
    assert_eq!(*seen.lock().unwrap(), vec!["2024-01-01T00:05:00Z"]);
}
