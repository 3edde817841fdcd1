//! MiniMax usage client.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use tallybar_core::{
    ErrorState, ProviderKind, ProviderUsageResult, UsageProvider, UsageWindow,
};

use crate::http;

/// Subscription endpoint.
const SUBSCRIPTION_URL: &str = "https://api.minimax.io/v1/user/subscription";

/// Environment variable holding the API key.
const API_KEY_ENV: &str = "MINIMAX_API_KEY";

// ============================================================================
// API Response Types
// ============================================================================

/// Response from the subscription endpoint.
#[derive(Debug, Deserialize)]
pub struct MinimaxSubscriptionResponse {
    /// Subscription payload.
    pub subscription: Option<MinimaxSubscription>,
}

/// Subscription quota figures.
#[derive(Debug, Deserialize)]
pub struct MinimaxSubscription {
    /// Plan name (e.g., "coding-pro").
    #[serde(default)]
    pub plan: Option<String>,
    /// Quota used in the current period.
    pub quota_used: f64,
    /// Total quota for the current period.
    pub quota_total: f64,
    /// When the subscription period renews.
    #[serde(default)]
    pub renews_at: Option<DateTime<Utc>>,
}

impl MinimaxSubscriptionResponse {
    /// Normalizes the response into a usage result.
    pub fn into_result(self, now: DateTime<Utc>) -> ProviderUsageResult {
        let mut result = ProviderUsageResult::success(ProviderKind::Minimax, now);

        if let Some(subscription) = self.subscription {
            if subscription.quota_total > 0.0 {
                let percent =
                    (subscription.quota_used / subscription.quota_total) * 100.0;
                let mut window = UsageWindow::new(percent);
                if let Some(renews_at) = subscription.renews_at {
                    window = window.with_resets_at(renews_at);
                }
                result = result.with_primary_window(window);
            }
            if let Some(plan) = subscription.plan {
                result = result.with_account_label(plan);
            }
        }

        result
    }
}

// ============================================================================
// Client
// ============================================================================

/// MiniMax provider client.
#[derive(Debug)]
pub struct MinimaxClient {
    http: reqwest::Client,
}

impl MinimaxClient {
    /// Creates a new client; the API key is read from `MINIMAX_API_KEY` at
    /// fetch time.
    pub fn new() -> Self {
        Self {
            http: http::build_client(),
        }
    }
}

impl Default for MinimaxClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UsageProvider for MinimaxClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Minimax
    }

    async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult {
        let Some(key) = http::api_key_from_env(API_KEY_ENV) else {
            return ProviderUsageResult::failure(
                ProviderKind::Minimax,
                ErrorState::AuthNeeded,
                now,
            );
        };

        debug!("fetching minimax subscription");
        match http::get_json::<MinimaxSubscriptionResponse>(
            self.http.get(SUBSCRIPTION_URL).bearer_auth(key),
        )
        .await
        {
            Ok(response) => response.into_result(now),
            Err(error) => ProviderUsageResult::failure(ProviderKind::Minimax, error, now),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
