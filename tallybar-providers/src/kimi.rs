//! Kimi (Moonshot) usage client.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use tallybar_core::{
    ErrorState, ProviderKind, ProviderUsageResult, UsageProvider, UsageWindow,
};

use crate::http;

/// Balance endpoint.
const BALANCE_URL: &str = "https://api.moonshot.ai/v1/users/me/balance";

/// Environment variable holding the API key.
const API_KEY_ENV: &str = "MOONSHOT_API_KEY";

// ============================================================================
// API Response Types
// ============================================================================

/// Response envelope from the balance endpoint.
#[derive(Debug, Deserialize)]
pub struct KimiBalanceResponse {
    /// Balance payload.
    pub data: Option<KimiBalance>,
}

/// Account balance figures.
#[derive(Debug, Deserialize)]
pub struct KimiBalance {
    /// Balance still available.
    pub available_balance: f64,
    /// Total granted for the period, when the account reports one.
    #[serde(default)]
    pub total_granted: Option<f64>,
}

impl KimiBalanceResponse {
    /// Normalizes the response into a usage result.
    ///
    /// A usable percentage needs a total grant; a bare balance produces a
    /// data-less success rather than a fabricated window.
    pub fn into_result(self, now: DateTime<Utc>) -> ProviderUsageResult {
        let mut result = ProviderUsageResult::success(ProviderKind::Kimi, now);

        if let Some(balance) = &self.data {
            if let Some(total) = balance.total_granted {
                if total > 0.0 {
                    let used = (total - balance.available_balance).max(0.0);
                    result = result.with_primary_window(UsageWindow::new(
                        (used / total) * 100.0,
                    ));
                }
            }
        }

        result
    }
}

// ============================================================================
// Client
// ============================================================================

/// Kimi provider client.
#[derive(Debug)]
pub struct KimiClient {
    http: reqwest::Client,
}

impl KimiClient {
    /// Creates a new client; the API key is read from `MOONSHOT_API_KEY`
    /// at fetch time.
    pub fn new() -> Self {
        Self {
            http: http::build_client(),
        }
    }
}

impl Default for KimiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UsageProvider for KimiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Kimi
    }

    async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult {
        let Some(key) = http::api_key_from_env(API_KEY_ENV) else {
            return ProviderUsageResult::failure(ProviderKind::Kimi, ErrorState::AuthNeeded, now);
        };

        debug!("fetching kimi balance");
        match http::get_json::<KimiBalanceResponse>(self.http.get(BALANCE_URL).bearer_auth(key))
            .await
        {
            Ok(response) => response.into_result(now),
            Err(error) => ProviderUsageResult::failure(ProviderKind::Kimi, error, now),
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
    fn test_parse_balance_with_total() {
        let json = r#"{"data": {"available_balance": 2.5, "total_granted": 10.0}}"#;
        let response: KimiBalanceResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(Utc::now());
        assert_eq!(result.primary_window.as_ref().unwrap().used_percent, 75.0);
    }

    #[test]
    fn test_balance_without_total_has_no_window() {
        let json = r#"{"data": {"available_balance": 2.5}}"#;
        let response: KimiBalanceResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(Utc::now());
        assert!(!result.has_data());
        assert!(result.error_state.is_none());
    }

    #[test]
    fn test_overdrawn_balance_clamps() {
        let json = r#"{"data": {"available_balance": -1.0, "total_granted": 10.0}}"#;
        let response: KimiBalanceResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(Utc::now());
        assert_eq!(result.primary_window.as_ref().unwrap().used_percent, 100.0);
    }
}
