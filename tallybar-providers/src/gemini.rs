//! Gemini usage client.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use tallybar_core::{
    ErrorState, ProviderKind, ProviderUsageResult, UsageProvider, UsageWindow,
};

use crate::http;

/// Quota endpoint.
const QUOTA_URL: &str = "https://generativelanguage.googleapis.com/v1beta/quota";

/// Environment variable holding the API key.
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Daily window length.
const DAY_WINDOW_SECS: u64 = 24 * 60 * 60;

// ============================================================================
// API Response Types
// ============================================================================

/// Response from the quota endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiQuotaResponse {
    /// Daily request counter.
    pub daily_requests: Option<GeminiCounter>,
    /// When the daily quota resets.
    #[serde(default)]
    pub reset_time: Option<DateTime<Utc>>,
    /// Subscription tier (e.g., "free", "ai-pro").
    #[serde(default)]
    pub tier: Option<String>,
}

/// A used/limit counter pair.
#[derive(Debug, Deserialize)]
pub struct GeminiCounter {
    /// Requests used so far.
    pub used: u64,
    /// Request limit for the window.
    pub limit: u64,
}

impl GeminiQuotaResponse {
    /// Normalizes the response into a usage result.
    pub fn into_result(self, now: DateTime<Utc>) -> ProviderUsageResult {
        let mut result = ProviderUsageResult::success(ProviderKind::Gemini, now);

        if let Some(counter) = &self.daily_requests {
            if counter.limit > 0 {
                #[allow(clippy::cast_precision_loss)]
                let percent = (counter.used as f64 / counter.limit as f64) * 100.0;
                let mut window =
                    UsageWindow::new(percent).with_window_seconds(DAY_WINDOW_SECS);
                if let Some(reset_time) = self.reset_time {
                    window = window.with_resets_at(reset_time);
                }
                result = result.with_primary_window(window);
            }
        }
        if let Some(tier) = self.tier {
            result = result.with_account_label(tier);
        }

        result
    }
}

// ============================================================================
// Client
// ============================================================================

/// Gemini provider client.
#[derive(Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
}

impl GeminiClient {
    /// Creates a new client; the API key is read from `GEMINI_API_KEY` at
    /// fetch time.
    pub fn new() -> Self {
        Self {
            http: http::build_client(),
        }
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UsageProvider for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult {
        let Some(key) = http::api_key_from_env(API_KEY_ENV) else {
            return ProviderUsageResult::failure(
                ProviderKind::Gemini,
                ErrorState::AuthNeeded,
                now,
            );
        };

        debug!("fetching gemini quota");
        let request = self.http.get(QUOTA_URL).header("x-goog-api-key", key);
        match http::get_json::<GeminiQuotaResponse>(request).await {
            Ok(response) => response.into_result(now),
            Err(error) => ProviderUsageResult::failure(ProviderKind::Gemini, error, now),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quota_response() {
        let json = r#"{
            "dailyRequests": {"used": 250, "limit": 1000},
            "resetTime": "2026-08-08T00:00:00Z",
            "tier": "ai-pro"
        }"#;

        let response: GeminiQuotaResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(Utc::now());

        let primary = result.primary_window.as_ref().unwrap();
        assert_eq!(primary.used_percent, 25.0);
        assert_eq!(primary.window_seconds, Some(DAY_WINDOW_SECS));
        assert!(primary.resets_at.is_some());
        assert_eq!(result.account_label.as_deref(), Some("ai-pro"));
    }

    #[test]
    fn test_zero_limit_yields_no_window() {
        let json = r#"{"dailyRequests": {"used": 0, "limit": 0}}"#;
        let response: GeminiQuotaResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(Utc::now());
        assert!(!result.has_data());
    }
}
