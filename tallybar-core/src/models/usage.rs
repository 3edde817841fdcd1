//! Usage windows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Usage Window
// ============================================================================

/// A single quota measurement window.
///
/// `used_percent` is clamped to `[0, 100]` at construction; a window read
/// back out of a snapshot is always in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    /// Percentage of quota used (0-100).
    pub used_percent: f64,
    /// When this window resets.
    pub resets_at: Option<DateTime<Utc>>,
    /// Duration the window covers, in seconds (18000 = 5 hours).
    pub window_seconds: Option<u64>,
}

impl UsageWindow {
    /// Creates a new usage window with the given percentage.
    ///
    /// Non-finite values are coerced to 0 and the result is clamped to
    /// `[0, 100]`.
    pub fn new(used_percent: f64) -> Self {
        let used_percent = if used_percent.is_finite() {
            used_percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            used_percent,
            resets_at: None,
            window_seconds: None,
        }
    }

    /// Sets the reset time.
    pub fn with_resets_at(mut self, resets_at: DateTime<Utc>) -> Self {
        self.resets_at = Some(resets_at);
        self
    }

    /// Sets the window duration in seconds.
    pub fn with_window_seconds(mut self, window_seconds: u64) -> Self {
        self.window_seconds = Some(window_seconds);
        self
    }

    /// Returns the remaining percentage (100 - used), clamped to `[0, 100]`.
    pub fn remaining_percent(&self) -> f64 {
        (100.0 - self.used_percent).clamp(0.0, 100.0)
    }

    /// Returns true if usage has reached the limit.
    pub fn is_over_limit(&self) -> bool {
        self.used_percent >= 100.0
    }

    /// Returns the window duration as a chrono Duration.
    pub fn window_duration(&self) -> Option<Duration> {
        self.window_seconds
            .and_then(|secs| i64::try_from(secs).ok())
            .map(Duration::seconds)
    }
}

impl Default for UsageWindow {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// ============================================================================
// Per-Model Usage
// ============================================================================

/// A quota window scoped to a single model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Model name as reported by the provider (e.g., "opus").
    pub model: String,
    /// The window for this model.
    pub window: UsageWindow,
}

impl ModelUsage {
    /// Creates a new per-model usage entry.
    pub fn new(model: impl Into<String>, window: UsageWindow) -> Self {
        Self {
            model: model.into(),
            window,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
