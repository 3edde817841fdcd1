//! Cerebras usage client.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use tallybar_core::{
    ErrorState, ModelUsage, ProviderKind, ProviderUsageResult, UsageProvider, UsageWindow,
};

use crate::http;

/// Quota endpoint.
const QUOTA_URL: &str = "https://api.cerebras.ai/v1/quotas";

/// Environment variable holding the API key.
const API_KEY_ENV: &str = "CEREBRAS_API_KEY";

/// Daily window length.
const DAY_WINDOW_SECS: u64 = 24 * 60 * 60;

// ============================================================================
// API Response Types
// ============================================================================

/// Response from the quota endpoint: one daily token quota per model.
#[derive(Debug, Deserialize)]
pub struct CerebrasQuotaResponse {
    /// Per-model quotas.
    #[serde(default)]
    pub models: Vec<CerebrasModelQuota>,
    /// When the daily quotas reset.
    #[serde(default)]
    pub resets_at: Option<DateTime<Utc>>,
}

/// Daily token quota for one model.
#[derive(Debug, Deserialize)]
pub struct CerebrasModelQuota {
    /// Model name.
    pub model: String,
    /// Tokens used today.
    pub tokens_used: u64,
    /// Daily token limit.
    pub tokens_limit: u64,
}

impl CerebrasModelQuota {
    fn used_percent(&self) -> Option<f64> {
        if self.tokens_limit == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some((self.tokens_used as f64 / self.tokens_limit as f64) * 100.0)
    }
}

impl CerebrasQuotaResponse {
    /// Normalizes the response into a usage result.
    ///
    /// The primary window tracks the most-used model; every model also
    /// gets its own per-model row.
    pub fn into_result(self, now: DateTime<Utc>) -> ProviderUsageResult {
        let mut result = ProviderUsageResult::success(ProviderKind::Cerebras, now);
        let mut highest: Option<UsageWindow> = None;

        for quota in &self.models {
            let Some(percent) = quota.used_percent() else {
                continue;
            };
            let mut window = UsageWindow::new(percent).with_window_seconds(DAY_WINDOW_SECS);
            if let Some(resets_at) = self.resets_at {
                window = window.with_resets_at(resets_at);
            }
            if highest
                .as_ref()
                .is_none_or(|current| window.used_percent > current.used_percent)
            {
                highest = Some(window.clone());
            }
            result = result.with_model_window(ModelUsage::new(quota.model.clone(), window));
        }

        if let Some(window) = highest {
            result = result.with_primary_window(window);
        }
        result
    }
}

// ============================================================================
// Client
// ============================================================================

/// Cerebras provider client.
#[derive(Debug)]
pub struct CerebrasClient {
    http: reqwest::Client,
}

impl CerebrasClient {
    /// Creates a new client; the API key is read from `CEREBRAS_API_KEY`
    /// at fetch time.
    pub fn new() -> Self {
        Self {
            http: http::build_client(),
        }
    }
}

impl Default for CerebrasClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UsageProvider for CerebrasClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cerebras
    }

    async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult {
        let Some(key) = http::api_key_from_env(API_KEY_ENV) else {
            return ProviderUsageResult::failure(
                ProviderKind::Cerebras,
                ErrorState::AuthNeeded,
                now,
            );
        };

        debug!("fetching cerebras quotas");
        match http::get_json::<CerebrasQuotaResponse>(self.http.get(QUOTA_URL).bearer_auth(key))
            .await
        {
            Ok(response) => response.into_result(now),
            Err(error) => ProviderUsageResult::failure(ProviderKind::Cerebras, error, now),
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
            "models": [
                {"model": "llama-4-maverick", "tokens_used": 1500000, "tokens_limit": 3000000},
                {"model": "qwen-3-coder", "tokens_used": 2700000, "tokens_limit": 3000000}
            ],
            "resets_at": "2026-08-08T00:00:00Z"
        }"#;

        let response: CerebrasQuotaResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(Utc::now());

        assert_eq!(result.per_model_windows.len(), 2);
        // Primary tracks the most-used model.
        assert_eq!(result.primary_window.as_ref().unwrap().used_percent, 90.0);
        assert_eq!(result.per_model_windows[0].model, "llama-4-maverick");
        assert_eq!(result.per_model_windows[0].window.used_percent, 50.0);
    }

    #[test]
    fn test_empty_models_yields_no_window() {
        let json = r#"{"models": []}"#;
        let response: CerebrasQuotaResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(Utc::now());
        assert!(!result.has_data());
    }
}
