//! Per-provider fetch results and the aggregate snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::provider::ProviderKind;
use super::status::ErrorState;
use super::usage::{ModelUsage, UsageWindow};

// ============================================================================
// Provider Usage Result
// ============================================================================

/// The outcome of one provider fetch.
///
/// A result carries usage data, an error state, or (while a stale fallback
/// is shown) both. `is_stale` is set only by the aggregator when it re-shows
/// a previously cached success under a fresh error; provider clients never
/// set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUsageResult {
    /// The provider this result belongs to.
    pub provider: ProviderKind,
    /// Primary quota window (session-scale).
    pub primary_window: Option<UsageWindow>,
    /// Secondary quota window (weekly/monthly-scale).
    pub secondary_window: Option<UsageWindow>,
    /// Per-model quota windows.
    #[serde(default)]
    pub per_model_windows: Vec<ModelUsage>,
    /// Account label (email, plan name) when the provider reports one.
    pub account_label: Option<String>,
    /// When the data was observed (the refresh cycle's start time).
    pub observed_at: DateTime<Utc>,
    /// Failure state of the most recent fetch, if any.
    pub error_state: Option<ErrorState>,
    /// True when the data fields come from an older cached success.
    #[serde(default)]
    pub is_stale: bool,
}

impl ProviderUsageResult {
    /// Creates a successful result with no windows attached yet.
    pub fn success(provider: ProviderKind, observed_at: DateTime<Utc>) -> Self {
        Self {
            provider,
            primary_window: None,
            secondary_window: None,
            per_model_windows: Vec::new(),
            account_label: None,
            observed_at,
            error_state: None,
            is_stale: false,
        }
    }

    /// Creates a failed result carrying the given error.
    pub fn failure(
        provider: ProviderKind,
        error: ErrorState,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            provider,
            primary_window: None,
            secondary_window: None,
            per_model_windows: Vec::new(),
            account_label: None,
            observed_at,
            error_state: Some(error),
            is_stale: false,
        }
    }

    /// Derives a stale result from a cached success.
    ///
    /// Data fields and `observed_at` are reused verbatim from `cached`;
    /// only `error_state` and `is_stale` are replaced.
    pub fn stale_from(cached: &ProviderUsageResult, error: ErrorState) -> Self {
        Self {
            error_state: Some(error),
            is_stale: true,
            ..cached.clone()
        }
    }

    /// Sets the primary window.
    pub fn with_primary_window(mut self, window: UsageWindow) -> Self {
        self.primary_window = Some(window);
        self
    }

    /// Sets the secondary window.
    pub fn with_secondary_window(mut self, window: UsageWindow) -> Self {
        self.secondary_window = Some(window);
        self
    }

    /// Appends a per-model window.
    pub fn with_model_window(mut self, usage: ModelUsage) -> Self {
        self.per_model_windows.push(usage);
        self
    }

    /// Sets the account label.
    pub fn with_account_label(mut self, label: impl Into<String>) -> Self {
        self.account_label = Some(label.into());
        self
    }

    /// Returns true if any window data is present.
    pub fn has_data(&self) -> bool {
        self.primary_window.is_some()
            || self.secondary_window.is_some()
            || !self.per_model_windows.is_empty()
    }
}

// ============================================================================
// Usage Snapshot
// ============================================================================

/// The aggregate application state published to subscribers.
///
/// `results` holds at most one entry per provider, in declaration order.
/// `last_updated` is the start time of the most recent *completed* refresh
/// cycle; intermediate in-cycle publishes leave it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// One result per provider that has reported so far, declaration order.
    pub results: Vec<ProviderUsageResult>,
    /// Start time of the most recent completed refresh cycle.
    pub last_updated: Option<DateTime<Utc>>,
    /// True while a refresh cycle is in flight.
    pub is_refreshing: bool,
}

impl UsageSnapshot {
    /// Creates the empty initial snapshot.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            last_updated: None,
            is_refreshing: false,
        }
    }

    /// Returns the result for a provider, if it has reported.
    pub fn result_for(&self, provider: ProviderKind) -> Option<&ProviderUsageResult> {
        self.results.iter().find(|r| r.provider == provider)
    }

    /// The minimum remaining percentage across all primary windows.
    ///
    /// Drives the single aggregate health indicator. `None` when no
    /// provider has primary data.
    pub fn minimum_remaining_percent(&self) -> Option<f64> {
        self.results
            .iter()
            .filter_map(|r| r.primary_window.as_ref())
            .map(UsageWindow::remaining_percent)
            .fold(None, |min, value| match min {
                Some(current) if current <= value => Some(current),
                _ => Some(value),
            })
    }
}

impl Default for UsageSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn success_with_percent(provider: ProviderKind, percent: f64) -> ProviderUsageResult {
        ProviderUsageResult::success(provider, Utc::now())
            .with_primary_window(UsageWindow::new(percent))
    }

    #[test]
    fn test_stale_from_reuses_data_verbatim() {
        let cached = success_with_percent(ProviderKind::Claude, 10.0)
            .with_secondary_window(UsageWindow::new(40.0))
            .with_account_label("user@example.com");

        let stale = ProviderUsageResult::stale_from(
            &cached,
            ErrorState::NetworkError("connection reset".into()),
        );

        assert!(stale.is_stale);
        assert_eq!(stale.primary_window, cached.primary_window);
        assert_eq!(stale.secondary_window, cached.secondary_window);
        assert_eq!(stale.account_label, cached.account_label);
        assert_eq!(stale.observed_at, cached.observed_at);
        assert_eq!(
            stale.error_state,
            Some(ErrorState::NetworkError("connection reset".into()))
        );
    }

    #[test]
    fn test_minimum_remaining_percent() {
        let mut snapshot = UsageSnapshot::empty();
        assert_eq!(snapshot.minimum_remaining_percent(), None);

        snapshot.results = vec![
            success_with_percent(ProviderKind::Claude, 90.0),
            ProviderUsageResult::failure(
                ProviderKind::Codex,
                ErrorState::AuthNeeded,
                Utc::now(),
            ),
            success_with_percent(ProviderKind::Gemini, 10.0),
        ];

        // Claude is 10% remaining; the errored provider contributes nothing.
        let min = snapshot.minimum_remaining_percent().unwrap();
        assert!((min - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_result_for() {
        let mut snapshot = UsageSnapshot::empty();
        snapshot.results = vec![success_with_percent(ProviderKind::Kimi, 5.0)];

        assert!(snapshot.result_for(ProviderKind::Kimi).is_some());
        assert!(snapshot.result_for(ProviderKind::Claude).is_none());
    }

    #[test]
    fn test_has_data() {
        let now = Utc::now();
        assert!(!ProviderUsageResult::success(ProviderKind::Zai, now).has_data());
        assert!(
            ProviderUsageResult::success(ProviderKind::Zai, now)
                .with_model_window(ModelUsage::new("glm-4", UsageWindow::new(1.0)))
                .has_data()
        );
    }
}
