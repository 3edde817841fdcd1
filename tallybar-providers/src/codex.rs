//! Codex usage client.
//!
//! Reuses the Codex CLI's stored ChatGPT token and queries the rate-limit
//! endpoint.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use tallybar_core::{
    ErrorState, ProviderKind, ProviderUsageResult, UsageProvider, UsageWindow,
};

use crate::http;

/// Usage endpoint for Codex subscription accounts.
const USAGE_URL: &str = "https://chatgpt.com/backend-api/codex/usage";

// ============================================================================
// Credentials
// ============================================================================

/// Shape of `~/.codex/auth.json`.
#[derive(Debug, Deserialize)]
struct AuthFile {
    tokens: Option<AuthTokens>,
}

#[derive(Debug, Deserialize)]
struct AuthTokens {
    access_token: String,
}

// ============================================================================
// API Response Types
// ============================================================================

/// Response from the usage endpoint.
#[derive(Debug, Deserialize)]
pub struct CodexUsageResponse {
    /// Rate-limit window pair.
    pub rate_limits: Option<CodexRateLimits>,
    /// Subscription plan (e.g., "plus", "pro").
    #[serde(default)]
    pub plan_type: Option<String>,
}

/// Primary/secondary rate-limit windows.
#[derive(Debug, Deserialize)]
pub struct CodexRateLimits {
    /// Short (session-scale) window.
    pub primary: Option<CodexRateWindow>,
    /// Long (weekly-scale) window.
    pub secondary: Option<CodexRateWindow>,
}

/// One rate-limit window.
#[derive(Debug, Deserialize)]
pub struct CodexRateWindow {
    /// Percentage of the window used (0-100).
    pub used_percent: f64,
    /// Window length in minutes.
    pub window_minutes: Option<u64>,
    /// Seconds until the window resets.
    pub resets_in_seconds: Option<i64>,
}

impl CodexRateWindow {
    fn to_window(&self, now: DateTime<Utc>) -> UsageWindow {
        let mut window = UsageWindow::new(self.used_percent);
        if let Some(minutes) = self.window_minutes {
            window = window.with_window_seconds(minutes * 60);
        }
        if let Some(seconds) = self.resets_in_seconds {
            window = window.with_resets_at(now + Duration::seconds(seconds));
        }
        window
    }
}

impl CodexUsageResponse {
    /// Normalizes the response into a usage result.
    pub fn into_result(self, now: DateTime<Utc>) -> ProviderUsageResult {
        let mut result = ProviderUsageResult::success(ProviderKind::Codex, now);

        if let Some(limits) = &self.rate_limits {
            if let Some(primary) = &limits.primary {
                result = result.with_primary_window(primary.to_window(now));
            }
            if let Some(secondary) = &limits.secondary {
                result = result.with_secondary_window(secondary.to_window(now));
            }
        }
        if let Some(plan) = self.plan_type {
            result = result.with_account_label(plan);
        }

        result
    }
}

// ============================================================================
// Client
// ============================================================================

/// Codex provider client.
#[derive(Debug)]
pub struct CodexClient {
    http: reqwest::Client,
    auth_path: std::path::PathBuf,
}

impl CodexClient {
    /// Creates a new client reading the Codex CLI auth file.
    pub fn new() -> Self {
        let auth_path = dirs::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join(".codex")
            .join("auth.json");
        Self {
            http: http::build_client(),
            auth_path,
        }
    }

    async fn load_token(&self) -> Result<String, ErrorState> {
        let raw = tokio::fs::read_to_string(&self.auth_path)
            .await
            .map_err(|_| ErrorState::AuthNeeded)?;
        let auth: AuthFile = serde_json::from_str(&raw).map_err(|_| ErrorState::AuthNeeded)?;
        auth.tokens
            .map(|tokens| tokens.access_token)
            .ok_or(ErrorState::AuthNeeded)
    }

    #[instrument(skip(self, token))]
    async fn fetch_parsed(&self, token: &str) -> Result<CodexUsageResponse, ErrorState> {
        debug!("fetching codex usage");
        http::get_json(self.http.get(USAGE_URL).bearer_auth(token)).await
    }
}

impl Default for CodexClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UsageProvider for CodexClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Codex
    }

    async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult {
        let token = match self.load_token().await {
            Ok(token) => token,
            Err(error) => return ProviderUsageResult::failure(ProviderKind::Codex, error, now),
        };
        match self.fetch_parsed(&token).await {
            Ok(response) => response.into_result(now),
            Err(error) => ProviderUsageResult::failure(ProviderKind::Codex, error, now),
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
    fn test_parse_usage_response() {
        let json = r#"{
            "rate_limits": {
                "primary": {"used_percent": 35.0, "window_minutes": 300, "resets_in_seconds": 4500},
                "secondary": {"used_percent": 61.5, "window_minutes": 10080, "resets_in_seconds": 86400}
            },
            "plan_type": "plus"
        }"#;

        let now = Utc::now();
        let response: CodexUsageResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(now);

        let primary = result.primary_window.as_ref().unwrap();
        assert_eq!(primary.used_percent, 35.0);
        assert_eq!(primary.window_seconds, Some(300 * 60));
        assert_eq!(primary.resets_at, Some(now + Duration::seconds(4500)));

        assert_eq!(result.secondary_window.as_ref().unwrap().used_percent, 61.5);
        assert_eq!(result.account_label.as_deref(), Some("plus"));
    }

    #[test]
    fn test_parse_empty_limits() {
        let json = r#"{"rate_limits": null}"#;
        let response: CodexUsageResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(Utc::now());

        assert!(!result.has_data());
        assert!(result.error_state.is_none());
    }

    #[test]
    fn test_auth_file_without_tokens_is_auth_needed() {
        let json = r#"{"OPENAI_API_KEY": null}"#;
        let auth: AuthFile = serde_json::from_str(json).unwrap();
        assert!(auth.tokens.is_none());
    }
}
