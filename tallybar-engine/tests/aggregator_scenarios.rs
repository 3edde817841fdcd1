//! End-to-end scenarios for the aggregation engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tallybar_core::{
    ErrorState, ProviderKind, ProviderUsageResult, UsageProvider, UsageWindow,
};
use tallybar_engine::UsageAggregator;

// ============================================================================
// Scripted Provider Stub
// ============================================================================

/// One scripted fetch outcome.
#[derive(Clone)]
enum Step {
    Success(f64),
    Failure(ErrorState),
}

/// Provider stub that replays a script, repeating the last step once the
/// script is exhausted.
struct ScriptedProvider {
    kind: ProviderKind,
    script: Vec<Step>,
    cursor: AtomicUsize,
}

impl ScriptedProvider {
    fn new(kind: ProviderKind, script: Vec<Step>) -> Arc<Self> {
        assert!(!script.is_empty());
        Arc::new(Self {
            kind,
            script,
            cursor: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl UsageProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let step = &self.script[index.min(self.script.len() - 1)];
        match step {
            Step::Success(percent) => ProviderUsageResult::success(self.kind, now)
                .with_primary_window(UsageWindow::new(*percent)),
            Step::Failure(error) => {
                ProviderUsageResult::failure(self.kind, error.clone(), now)
            }
        }
    }
}

fn aggregator_for(providers: Vec<Arc<dyn UsageProvider>>) -> UsageAggregator {
    UsageAggregator::new(providers, Duration::from_secs(60)).unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn first_cycle_with_mixed_outcomes() {
    let providers: Vec<Arc<dyn UsageProvider>> = vec![
        ScriptedProvider::new(ProviderKind::Claude, vec![Step::Success(10.0)]),
        ScriptedProvider::new(ProviderKind::Codex, vec![Step::Failure(ErrorState::AuthNeeded)]),
        ScriptedProvider::new(ProviderKind::Gemini, vec![Step::Success(90.0)]),
    ];
    let aggregator = aggregator_for(providers);

    aggregator.refresh_now().await;
    let snapshot = aggregator.current_snapshot().await;

    assert_eq!(snapshot.results.len(), 3);

    let codex = snapshot.result_for(ProviderKind::Codex).unwrap();
    assert_eq!(codex.error_state, Some(ErrorState::AuthNeeded));
    assert!(!codex.is_stale, "first-ever failure has nothing to fall back on");
    assert!(codex.primary_window.is_none());

    // Gemini is 10% remaining; Codex contributes no primary window.
    let min = snapshot.minimum_remaining_percent().unwrap();
    assert!((min - 10.0).abs() < 1e-9);
}

#[tokio::test]
async fn stale_fallback_retains_cached_data() {
    let providers: Vec<Arc<dyn UsageProvider>> = vec![
        ScriptedProvider::new(
            ProviderKind::Claude,
            vec![
                Step::Success(10.0),
                Step::Failure(ErrorState::NetworkError("connection reset".into())),
            ],
        ),
        ScriptedProvider::new(ProviderKind::Codex, vec![Step::Failure(ErrorState::AuthNeeded)]),
        ScriptedProvider::new(ProviderKind::Gemini, vec![Step::Success(90.0)]),
    ];
    let aggregator = aggregator_for(providers);

    aggregator.refresh_now().await;
    let first_observed = aggregator
        .current_snapshot()
        .await
        .result_for(ProviderKind::Claude)
        .unwrap()
        .observed_at;

    aggregator.refresh_now().await;
    let snapshot = aggregator.current_snapshot().await;
    let claude = snapshot.result_for(ProviderKind::Claude).unwrap();

    assert!(claude.is_stale);
    assert_eq!(
        claude.primary_window.as_ref().unwrap().used_percent,
        10.0,
        "cached data shown unchanged"
    );
    assert_eq!(
        claude.error_state,
        Some(ErrorState::NetworkError("connection reset".into()))
    );
    // observed_at still reflects when the data was actually fetched.
    assert_eq!(claude.observed_at, first_observed);
}

#[tokio::test]
async fn never_succeeded_provider_stays_unstale_across_cycles() {
    let providers: Vec<Arc<dyn UsageProvider>> = vec![ScriptedProvider::new(
        ProviderKind::Kimi,
        vec![Step::Failure(ErrorState::EndpointError("HTTP 503".into()))],
    )];
    let aggregator = aggregator_for(providers);

    aggregator.refresh_now().await;
    aggregator.refresh_now().await;

    let snapshot = aggregator.current_snapshot().await;
    let kimi = snapshot.result_for(ProviderKind::Kimi).unwrap();
    assert!(!kimi.is_stale);
    assert!(!kimi.has_data());
    assert_eq!(
        kimi.error_state,
        Some(ErrorState::EndpointError("HTTP 503".into()))
    );
    assert_eq!(snapshot.minimum_remaining_percent(), None);
}

#[tokio::test]
async fn recovery_clears_stale_flag() {
    let providers: Vec<Arc<dyn UsageProvider>> = vec![ScriptedProvider::new(
        ProviderKind::Zai,
        vec![
            Step::Success(25.0),
            Step::Failure(ErrorState::NetworkError("timeout".into())),
            Step::Success(30.0),
        ],
    )];
    let aggregator = aggregator_for(providers);

    aggregator.refresh_now().await;
    aggregator.refresh_now().await;
    assert!(
        aggregator
            .current_snapshot()
            .await
            .result_for(ProviderKind::Zai)
            .unwrap()
            .is_stale
    );

    aggregator.refresh_now().await;
    let zai_result = aggregator.current_snapshot().await;
    let zai = zai_result.result_for(ProviderKind::Zai).unwrap();
    assert!(!zai.is_stale);
    assert!(zai.error_state.is_none());
    assert_eq!(zai.primary_window.as_ref().unwrap().used_percent, 30.0);
}

#[tokio::test]
async fn late_subscriber_receives_latest_snapshot_first() {
    let providers: Vec<Arc<dyn UsageProvider>> = vec![ScriptedProvider::new(
        ProviderKind::Claude,
        vec![Step::Success(10.0), Step::Success(20.0)],
    )];
    let aggregator = aggregator_for(providers);

    aggregator.refresh_now().await;
    aggregator.refresh_now().await;

    let mut subscription = aggregator.subscribe().await;
    let first = subscription.next().await.unwrap();

    assert_eq!(first.results.len(), 1, "not the empty initial snapshot");
    assert!(first.last_updated.is_some());
    assert_eq!(
        first
            .result_for(ProviderKind::Claude)
            .unwrap()
            .primary_window
            .as_ref()
            .unwrap()
            .used_percent,
        20.0
    );
}

#[tokio::test]
async fn subscribers_observe_monotonic_timestamps() {
    let providers: Vec<Arc<dyn UsageProvider>> = vec![ScriptedProvider::new(
        ProviderKind::Claude,
        vec![Step::Success(10.0)],
    )];
    let aggregator = aggregator_for(providers);
    let mut subscription = aggregator.subscribe().await;

    for _ in 0..3 {
        aggregator.refresh_now().await;
    }

    let mut previous: Option<DateTime<Utc>> = None;
    while let Some(snapshot) = subscription.try_next() {
        // Ignore in-cycle publishes where the timestamp is still the old one.
        if let Some(updated) = snapshot.last_updated {
            if let Some(prev) = previous {
                assert!(updated >= prev);
            }
            previous = Some(updated);
        }
    }
    assert!(previous.is_some());
}

#[tokio::test]
async fn two_subscribers_see_identical_sequences() {
    let providers: Vec<Arc<dyn UsageProvider>> = vec![
        ScriptedProvider::new(ProviderKind::Claude, vec![Step::Success(10.0)]),
        ScriptedProvider::new(ProviderKind::Codex, vec![Step::Success(40.0)]),
    ];
    let aggregator = aggregator_for(providers);

    let mut a = aggregator.subscribe().await;
    let mut b = aggregator.subscribe().await;

    aggregator.refresh_now().await;

    let mut seen_a = Vec::new();
    while let Some(snapshot) = a.try_next() {
        seen_a.push(snapshot);
    }
    let mut seen_b = Vec::new();
    while let Some(snapshot) = b.try_next() {
        seen_b.push(snapshot);
    }

    assert_eq!(seen_a, seen_b);
    // attach + refreshing + 2 merges + final.
    assert_eq!(seen_a.len(), 5);
}
