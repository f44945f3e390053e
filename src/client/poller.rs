//! Background polling over Gowalla activity feeds
//!
//! The registry owns one worker task per subscription. Each worker runs its
//! own timer, fetches its target's feed on every tick, delivers events newer
//! than its cursor to the subscription callback, and reports lifecycle
//! changes on a shared notification channel.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use compact_str::ToCompactString;
use tokio::{
    sync::{broadcast, mpsc::UnboundedSender},
    task::JoinHandle,
    time::{sleep, timeout},
};
use tracing::{debug, info, instrument, warn};

use super::{
    config::PollingConfig,
    error::{ClientError, Result},
    fetcher::{FeedSource, PollTarget},
};
use crate::{
    cursor::PollCursor,
    dispatcher::Dispatcher,
    domain::ActivityDto,
    event::PollEvent,
    id::SubscriptionId,
};

/// Observer invoked once per newly discovered event.
///
/// A returned error is tick-local: it is reported as a `CallbackFailed`
/// notification and does not block delivery of the remaining events.
pub type EventCallback =
    Arc<dyn Fn(&ActivityDto) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync>;

/// Registry of active polling subscriptions.
///
/// Subscriptions are keyed by an auto-incrementing [`SubscriptionId`], so two
/// `add` calls for the same target deliberately produce two independent
/// workers with their own timers and cursors.
pub struct PollRegistry {
    source: Arc<dyn FeedSource>,
    sender: UnboundedSender<PollEvent>,
    polling: PollingConfig,
    workers: Mutex<HashMap<SubscriptionId, WorkerHandle>>,
    next_id: AtomicU64,
}

struct WorkerHandle {
    target: PollTarget,
    shutdown_tx: broadcast::Sender<()>,
    _task: JoinHandle<()>,
}

impl PollRegistry {
    /// Create a registry that fetches through `source` and emits lifecycle
    /// notifications on `sender`.
    pub fn new(source: Arc<dyn FeedSource>, sender: UnboundedSender<PollEvent>) -> Self {
        Self {
            source,
            sender,
            polling: PollingConfig::default(),
            workers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Set the polling defaults used when `add` is not given an interval
    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Start polling a target.
    ///
    /// `interval` falls back to the registry's [`PollingConfig`] default when
    /// `None`. `cursor_seed` establishes the initial high-water mark; `None`
    /// means "now", so only events created after this call are considered
    /// new.
    #[instrument(skip(self, callback), fields(target = %target, interval = ?interval))]
    pub fn add(
        &self,
        target: PollTarget,
        interval: Option<Duration>,
        cursor_seed: Option<DateTime<Utc>>,
        callback: EventCallback,
    ) -> Result<SubscriptionId> {
        let interval = interval.unwrap_or(self.polling.interval);
        if interval.is_zero() {
            return Err(ClientError::InvalidInterval(interval));
        }

        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(PollWorker::run(
            id,
            Arc::clone(&self.source),
            target.clone(),
            interval,
            PollCursor::new(cursor_seed),
            callback,
            self.sender.clone(),
            shutdown_rx,
        ));

        self.workers.lock().unwrap().insert(
            id,
            WorkerHandle { target: target.clone(), shutdown_tx, _task: task },
        );

        info!(subscription_id = %id, "Started polling subscription");
        self.sender.dispatch(PollEvent::SubscriptionAdded(id, target));
        Ok(id)
    }

    /// Stop a subscription and drop it from the registry.
    ///
    /// Unknown or already-removed ids are a no-op with a diagnostic: a
    /// `SubscriptionNotFound` notification goes out and `false` comes back.
    #[instrument(skip(self))]
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let handle = self.workers.lock().unwrap().remove(&id);

        match handle {
            Some(handle) => {
                handle.stop();
                info!(subscription_id = %id, "Removed polling subscription");
                self.sender.dispatch(PollEvent::SubscriptionRemoved(id));
                true
            },
            None => {
                warn!(subscription_id = %id, "Remove called for unknown subscription");
                self.sender.dispatch(PollEvent::SubscriptionNotFound(id));
                false
            },
        }
    }

    /// Target of an active subscription, if it exists
    pub fn target(&self, id: SubscriptionId) -> Option<PollTarget> {
        self.workers
            .lock()
            .unwrap()
            .get(&id)
            .map(|handle| handle.target.clone())
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.workers.lock().unwrap().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.workers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.lock().unwrap().is_empty()
    }

    /// Stop every subscription. Emits `SubscriptionRemoved` for each.
    pub fn shutdown(&self) {
        let workers: Vec<_> = {
            let mut map = self.workers.lock().unwrap();
            map.drain().collect()
        };

        debug!(count = workers.len(), "Shutting down poll registry");
        for (id, handle) in workers {
            handle.stop();
            self.sender.dispatch(PollEvent::SubscriptionRemoved(id));
        }
    }
}

impl std::fmt::Debug for PollRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PollRegistry")
            .field("subscriptions", &self.len())
            .finish()
    }
}

impl WorkerHandle {
    /// Idempotent: a worker that already stopped just ignores the signal.
    fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for PollRegistry {
    fn drop(&mut self) {
        if let Ok(map) = self.workers.lock() {
            for handle in map.values() {
                handle.stop();
            }
        }
    }
}

/// One subscription's polling loop.
struct PollWorker;

impl PollWorker {
    /// Run the repeating tick loop until shutdown.
    ///
    /// Ticks never overlap for one subscription: the fetch and the delivery
    /// both happen inline before the next sleep begins. The fetch races the
    /// shutdown signal, so a `remove` during an in-flight fetch discards its
    /// result without delivering or touching the cursor.
    #[allow(clippy::too_many_arguments)]
    #[instrument(
        skip(source, cursor, callback, sender, shutdown_rx),
        fields(subscription_id = %id, target = %target)
    )]
    async fn run(
        id: SubscriptionId,
        source: Arc<dyn FeedSource>,
        target: PollTarget,
        interval: Duration,
        mut cursor: PollCursor,
        callback: EventCallback,
        sender: UnboundedSender<PollEvent>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        debug!("Starting polling loop");

        // A stuck fetch must not eat into the next scheduled tick
        let fetch_timeout = interval.min(Duration::from_secs(30));

        loop {
            tokio::select! {
                _ = sleep(interval) => {},
                _ = shutdown_rx.recv() => {
                    debug!("Polling loop received shutdown signal");
                    break;
                },
            }

            sender.dispatch(PollEvent::TickStarted(id));

            let fetched = tokio::select! {
                fetched = timeout(fetch_timeout, source.fetch_feed(&target)) => fetched,
                _ = shutdown_rx.recv() => {
                    debug!("Shutdown during in-flight fetch, discarding result");
                    break;
                },
            };

            let page = match fetched {
                Ok(Ok(page)) => page,
                Ok(Err(e)) => {
                    if e.is_transient() {
                        debug!(error = %e, "Fetch failed, will retry next tick");
                    } else {
                        warn!(error = %e, "Fetch failed with a non-transient error");
                    }
                    sender.dispatch(PollEvent::FetchFailed(id, e.to_compact_string()));
                    continue;
                },
                Err(_) => {
                    let e = ClientError::Timeout;
                    debug!(error = %e, "Fetch timed out, will retry next tick");
                    sender.dispatch(PollEvent::FetchFailed(id, e.to_compact_string()));
                    continue;
                },
            };

            Self::on_page(id, &mut cursor, &page, &callback, &sender);
        }

        debug!("Polling loop ended");
    }

    /// Deliver a fetched page and advance the cursor.
    fn on_page(
        id: SubscriptionId,
        cursor: &mut PollCursor,
        page: &[ActivityDto],
        callback: &EventCallback,
        sender: &UnboundedSender<PollEvent>,
    ) {
        let outcome = cursor.scan(page);

        if outcome.malformed > 0 {
            warn!(
                skipped = outcome.malformed,
                "Skipped events with unparseable timestamps"
            );
        }

        // Oldest new event first, so observers see history in order
        let deliver = callback.as_ref();
        for event in &outcome.fresh {
            if let Err(e) = deliver(event) {
                warn!(error = %e, "Subscription callback failed");
                sender.dispatch(PollEvent::CallbackFailed(id, e.to_compact_string()));
            } else {
                sender.dispatch(PollEvent::EventDelivered(id, event.clone()));
            }
        }

        // Advance even when deliveries failed, so one bad event cannot cause
        // a redelivery storm on every following tick. Empty pages leave the
        // cursor untouched.
        if let Some(newest) = outcome.newest
            && cursor.advance(newest)
        {
            debug!(cursor = %cursor.position(), "Advanced cursor");
        }
    }
}
