//! The usage aggregator.
//!
//! Owns the refresh cycle: concurrent per-provider fan-out, merge with
//! stale-data fallback, and snapshot publication.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tallybar_core::{ProviderKind, ProviderUsageResult, UsageProvider, UsageSnapshot};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::error::EngineError;
use crate::hub::{Subscription, SubscriptionHub};

/// Default poll interval between refresh cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// Engine State
// ============================================================================

/// Mutable aggregator state.
///
/// All reads and writes go through the aggregator's `RwLock`, one at a
/// time; the write guard is never held across an await point. Fetches run
/// outside this serialized region and re-enter it only to merge.
struct EngineState {
    /// Provider declaration order; fixes each provider's row position.
    order: Vec<ProviderKind>,
    /// Latest merged result per provider.
    slots: HashMap<ProviderKind, ProviderUsageResult>,
    /// Last-known-good results for stale fallback.
    cache: ResultCache,
    /// Live subscribers.
    hub: SubscriptionHub,
    /// Start time of the most recent completed cycle.
    last_updated: Option<DateTime<Utc>>,
    /// True while a cycle is in flight.
    is_refreshing: bool,
}

impl EngineState {
    fn new(order: Vec<ProviderKind>) -> Self {
        Self {
            order,
            slots: HashMap::new(),
            cache: ResultCache::new(),
            hub: SubscriptionHub::new(),
            last_updated: None,
            is_refreshing: false,
        }
    }

    /// Builds the snapshot from the current slots, in declaration order.
    fn assemble(&self) -> UsageSnapshot {
        UsageSnapshot {
            results: self
                .order
                .iter()
                .filter_map(|kind| self.slots.get(kind).cloned())
                .collect(),
            last_updated: self.last_updated,
            is_refreshing: self.is_refreshing,
        }
    }

    /// Publishes the current snapshot to all subscribers.
    fn publish(&mut self) {
        let snapshot = self.assemble();
        self.hub.publish(&snapshot);
    }

    /// Merges one completed fetch into the working result set.
    ///
    /// Success results are cached and stored verbatim. Failures fall back
    /// to the cached success (marked stale, carrying the new error) when
    /// one exists, and are stored as-is otherwise.
    fn merge(&mut self, incoming: ProviderUsageResult) {
        let provider = incoming.provider;
        let merged = match incoming.error_state.clone() {
            None => {
                self.cache.put(incoming.clone());
                incoming
            }
            Some(error) => {
                if let Some(cached) = self.cache.get(provider) {
                    debug!(provider = ?provider, "fetch failed, falling back to cached data");
                    ProviderUsageResult::stale_from(cached, error)
                } else {
                    incoming
                }
            }
        };

        if let Some(error) = &merged.error_state {
            warn!(provider = ?provider, error = %error, stale = merged.is_stale, "provider fetch failed");
        } else {
            debug!(provider = ?provider, "provider fetch merged");
        }
        self.slots.insert(provider, merged);
    }
}

// ============================================================================
// Usage Aggregator
// ============================================================================

/// The polling/aggregation engine.
///
/// Cheap to clone; all clones share the same state and subscriber registry.
/// Construct one instance at process startup and hand clones to consumers.
pub struct UsageAggregator {
    shared: Arc<Shared>,
}

struct Shared {
    providers: Vec<Arc<dyn UsageProvider>>,
    poll_interval: Duration,
    state: RwLock<EngineState>,
    loop_task: Mutex<Option<JoinHandle<()>>>,
}

impl Clone for UsageAggregator {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        // Resource hygiene on shutdown; fetches in flight are detached and
        // finish into a closed channel.
        if let Ok(mut guard) = self.loop_task.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl UsageAggregator {
    /// Creates an aggregator over the given provider clients.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoProviders`] for an empty list and
    /// [`EngineError::DuplicateProvider`] when two clients declare the same
    /// identity. Both are wiring mistakes, checked once at construction.
    pub fn new(
        providers: Vec<Arc<dyn UsageProvider>>,
        poll_interval: Duration,
    ) -> Result<Self, EngineError> {
        if providers.is_empty() {
            return Err(EngineError::NoProviders);
        }

        let mut order = Vec::with_capacity(providers.len());
        for provider in &providers {
            let kind = provider.kind();
            if order.contains(&kind) {
                return Err(EngineError::DuplicateProvider(kind));
            }
            order.push(kind);
        }

        Ok(Self {
            shared: Arc::new(Shared {
                providers,
                poll_interval,
                state: RwLock::new(EngineState::new(order)),
                loop_task: Mutex::new(None),
            }),
        })
    }

    /// The configured poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.shared.poll_interval
    }

    /// Starts the background poll loop.
    ///
    /// Idempotent: if a loop is already running this is a no-op. The loop
    /// refreshes immediately, then sleeps for the poll interval between
    /// cycles. Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let Ok(mut guard) = self.shared.loop_task.lock() else {
            return;
        };
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                debug!("poll loop already running");
                return;
            }
        }

        let engine = self.clone();
        let interval = self.shared.poll_interval;
        *guard = Some(tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "usage poll loop started");
            loop {
                engine.run_cycle().await;
                tokio::time::sleep(interval).await;
            }
        }));
    }

    /// Stops the background poll loop.
    ///
    /// Safe to call when not running. In-flight provider fetches from an
    /// already-started cycle are not cancelled; their results land in a
    /// closed channel and are discarded.
    pub fn stop(&self) {
        let Ok(mut guard) = self.shared.loop_task.lock() else {
            return;
        };
        if let Some(handle) = guard.take() {
            handle.abort();
            info!("usage poll loop stopped");
        }
    }

    /// Returns true while the poll loop is running.
    pub fn is_running(&self) -> bool {
        self.shared
            .loop_task
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    /// Performs exactly one refresh cycle and waits for it to complete.
    ///
    /// Independent of the poll loop's schedule; safe to call whether or not
    /// the loop is running.
    pub async fn refresh_now(&self) {
        self.run_cycle().await;
    }

    /// Subscribes to the snapshot stream.
    ///
    /// The current snapshot is delivered immediately, followed by every
    /// subsequent publish. Drop the subscription to disconnect.
    pub async fn subscribe(&self) -> Subscription {
        let mut state = self.shared.state.write().await;
        let current = state.assemble();
        state.hub.attach(current)
    }

    /// Returns the current snapshot.
    pub async fn current_snapshot(&self) -> UsageSnapshot {
        self.shared.state.read().await.assemble()
    }

    /// One refresh cycle: mark refreshing, fan out, merge completions as
    /// they arrive, finalize.
    async fn run_cycle(&self) {
        let started_at = Utc::now();
        debug!(providers = self.shared.providers.len(), "refresh cycle starting");

        {
            let mut state = self.shared.state.write().await;
            state.is_refreshing = true;
            state.publish();
        }

        // Unbounded fan-out: one detached task per provider, no timeout
        // imposed here. Detached tasks outlive a stopped loop; their sends
        // then hit a dropped receiver and are discarded.
        let (tx, mut rx) = mpsc::unbounded_channel();
        for provider in &self.shared.providers {
            let provider = Arc::clone(provider);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = provider.fetch_usage(started_at).await;
                let _ = tx.send(result);
            });
        }
        drop(tx);

        // Fan-in: merge in completion order, republishing after each merge
        // so rows update as data arrives.
        while let Some(result) = rx.recv().await {
            let mut state = self.shared.state.write().await;
            state.merge(result);
            state.publish();
        }

        let mut state = self.shared.state.write().await;
        state.is_refreshing = false;
        // Overlapping cycles can finalize out of order; keep the newest
        // cycle-start so published timestamps stay non-decreasing.
        state.last_updated = match state.last_updated {
            Some(previous) if previous > started_at => Some(previous),
            _ => Some(started_at),
        };
        state.publish();
        debug!("refresh cycle complete");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tallybar_core::{ErrorState, UsageWindow};

    /// Provider stub that counts calls and always succeeds at a fixed
    /// percentage.
    struct CountingProvider {
        kind: ProviderKind,
        percent: f64,
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new(kind: ProviderKind, percent: f64) -> Arc<Self> {
            Arc::new(Self {
                kind,
                percent,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl UsageProvider for CountingProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ProviderUsageResult::success(self.kind, now)
                .with_primary_window(UsageWindow::new(self.percent))
        }
    }

    /// Provider stub that always fails with the given error.
    struct FailingProvider {
        kind: ProviderKind,
        error: ErrorState,
    }

    #[async_trait]
    impl UsageProvider for FailingProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult {
            ProviderUsageResult::failure(self.kind, self.error.clone(), now)
        }
    }

    #[tokio::test]
    async fn test_duplicate_provider_rejected() {
        let providers: Vec<Arc<dyn UsageProvider>> = vec![
            CountingProvider::new(ProviderKind::Claude, 10.0),
            CountingProvider::new(ProviderKind::Claude, 20.0),
        ];
        assert!(matches!(
            UsageAggregator::new(providers, DEFAULT_POLL_INTERVAL),
            Err(EngineError::DuplicateProvider(ProviderKind::Claude))
        ));
    }

    #[tokio::test]
    async fn test_empty_provider_list_rejected() {
        assert!(matches!(
            UsageAggregator::new(Vec::new(), DEFAULT_POLL_INTERVAL),
            Err(EngineError::NoProviders)
        ));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let provider = CountingProvider::new(ProviderKind::Claude, 10.0);
        let aggregator = UsageAggregator::new(
            vec![provider.clone() as Arc<dyn UsageProvider>],
            Duration::from_secs(3600),
        )
        .unwrap();

        aggregator.start();
        aggregator.start();
        assert!(aggregator.is_running());

        // Give the single loop time for its one immediate refresh.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        aggregator.stop();
        assert!(!aggregator.is_running());
    }

    #[tokio::test]
    async fn test_stop_without_start_is_safe() {
        let aggregator = UsageAggregator::new(
            vec![CountingProvider::new(ProviderKind::Claude, 10.0) as Arc<dyn UsageProvider>],
            DEFAULT_POLL_INTERVAL,
        )
        .unwrap();
        aggregator.stop();
        assert!(!aggregator.is_running());
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let provider = CountingProvider::new(ProviderKind::Claude, 10.0);
        let aggregator = UsageAggregator::new(
            vec![provider.clone() as Arc<dyn UsageProvider>],
            Duration::from_secs(3600),
        )
        .unwrap();

        aggregator.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        aggregator.stop();

        aggregator.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        aggregator.stop();
    }

    #[tokio::test]
    async fn test_refresh_now_fills_all_slots() {
        let providers: Vec<Arc<dyn UsageProvider>> = vec![
            CountingProvider::new(ProviderKind::Claude, 10.0),
            CountingProvider::new(ProviderKind::Codex, 50.0),
            Arc::new(FailingProvider {
                kind: ProviderKind::Gemini,
                error: ErrorState::AuthNeeded,
            }),
        ];
        let aggregator = UsageAggregator::new(providers, DEFAULT_POLL_INTERVAL).unwrap();

        aggregator.refresh_now().await;

        let snapshot = aggregator.current_snapshot().await;
        assert_eq!(snapshot.results.len(), 3);
        assert!(!snapshot.is_refreshing);
        assert!(snapshot.last_updated.is_some());
        // Rows follow declaration order, not completion order.
        assert_eq!(snapshot.results[0].provider, ProviderKind::Claude);
        assert_eq!(snapshot.results[1].provider, ProviderKind::Codex);
        assert_eq!(snapshot.results[2].provider, ProviderKind::Gemini);
    }

    #[tokio::test]
    async fn test_incremental_publish_counts() {
        let providers: Vec<Arc<dyn UsageProvider>> = vec![
            CountingProvider::new(ProviderKind::Claude, 10.0),
            CountingProvider::new(ProviderKind::Codex, 20.0),
            CountingProvider::new(ProviderKind::Gemini, 30.0),
        ];
        let aggregator = UsageAggregator::new(providers, DEFAULT_POLL_INTERVAL).unwrap();

        let mut subscription = aggregator.subscribe().await;
        aggregator.refresh_now().await;

        // attach + refreshing + one per merge + final.
        let mut values = Vec::new();
        while let Some(snapshot) = subscription.try_next() {
            values.push(snapshot);
        }
        assert_eq!(values.len(), 6);
        assert!(values[0].results.is_empty());
        assert!(values[1].is_refreshing);
        assert_eq!(values[2].results.len(), 1);
        assert_eq!(values[3].results.len(), 2);
        assert_eq!(values[4].results.len(), 3);
        let last = &values[5];
        assert!(!last.is_refreshing);
        assert!(last.last_updated.is_some());
        // Intermediate publishes do not carry the new cycle timestamp.
        assert!(values[4].last_updated.is_none());
    }

    #[tokio::test]
    async fn test_last_updated_is_cycle_start_and_monotonic() {
        let aggregator = UsageAggregator::new(
            vec![CountingProvider::new(ProviderKind::Claude, 10.0) as Arc<dyn UsageProvider>],
            DEFAULT_POLL_INTERVAL,
        )
        .unwrap();

        let before = Utc::now();
        aggregator.refresh_now().await;
        let first = aggregator.current_snapshot().await.last_updated.unwrap();
        assert!(first >= before);

        aggregator.refresh_now().await;
        let second = aggregator.current_snapshot().await.last_updated.unwrap();
        assert!(second >= first);
    }
}
