//! z.ai usage client.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use tallybar_core::{
    ErrorState, ProviderKind, ProviderUsageResult, UsageProvider, UsageWindow,
};

use crate::http;

/// Usage endpoint.
const USAGE_URL: &str = "https://api.z.ai/v1/usage";

/// Environment variable holding the API key.
const API_KEY_ENV: &str = "ZAI_API_KEY";

// ============================================================================
// API Response Types
// ============================================================================

/// Response from the usage endpoint.
///
/// z.ai accounts report either a credit balance or a token counter
/// depending on plan; credits take precedence when both are present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZaiUsageResponse {
    /// Tokens used in the current period.
    #[serde(default)]
    pub tokens_used: Option<u64>,
    /// Token limit for the current period.
    #[serde(default)]
    pub token_limit: Option<u64>,
    /// Credits used in the current period.
    #[serde(default)]
    pub credits_used: Option<f64>,
    /// Credit limit for the current period.
    #[serde(default)]
    pub credit_limit: Option<f64>,
    /// When the period resets.
    #[serde(default)]
    pub reset_at: Option<DateTime<Utc>>,
    /// Plan name.
    #[serde(default)]
    pub plan: Option<String>,
}

impl ZaiUsageResponse {
    fn used_percent(&self) -> Option<f64> {
        if let (Some(used), Some(limit)) = (self.credits_used, self.credit_limit) {
            if limit > 0.0 {
                return Some((used / limit) * 100.0);
            }
        }
        if let (Some(used), Some(limit)) = (self.tokens_used, self.token_limit) {
            if limit > 0 {
                #[allow(clippy::cast_precision_loss)]
                return Some((used as f64 / limit as f64) * 100.0);
            }
        }
        None
    }

    /// Normalizes the response into a usage result.
    pub fn into_result(self, now: DateTime<Utc>) -> ProviderUsageResult {
        let mut result = ProviderUsageResult::success(ProviderKind::Zai, now);

        if let Some(percent) = self.used_percent() {
            let mut window = UsageWindow::new(percent);
            if let Some(reset_at) = self.reset_at {
                window = window.with_resets_at(reset_at);
            }
            result = result.with_primary_window(window);
        }
        if let Some(plan) = self.plan {
            result = result.with_account_label(plan);
        }

        result
    }
}

// ============================================================================
// Client
// ============================================================================

/// z.ai provider client.
#[derive(Debug)]
pub struct ZaiClient {
    http: reqwest::Client,
}

impl ZaiClient {
    /// Creates a new client; the API key is read from `ZAI_API_KEY` at
    /// fetch time.
    pub fn new() -> Self {
        Self {
            http: http::build_client(),
        }
    }
}

impl Default for ZaiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UsageProvider for ZaiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Zai
    }

    async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult {
        let Some(key) = http::api_key_from_env(API_KEY_ENV) else {
            return ProviderUsageResult::failure(ProviderKind::Zai, ErrorState::AuthNeeded, now);
        };

        debug!("fetching z.ai usage");
        match http::get_json::<ZaiUsageResponse>(self.http.get(USAGE_URL).bearer_auth(key)).await
        {
            Ok(response) => response.into_result(now),
            Err(error) => ProviderUsageResult::failure(ProviderKind::Zai, error, now),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
