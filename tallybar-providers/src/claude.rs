//! Claude usage client.
//!
//! Reuses the Claude Code CLI's OAuth credential and queries the
//! subscription usage endpoint.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use tallybar_core::{
    ErrorState, ModelUsage, ProviderKind, ProviderUsageResult, UsageProvider, UsageWindow,
};

use crate::http;

// ============================================================================
// Constants
// ============================================================================

/// Usage endpoint for Claude subscription accounts.
const USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";

/// Beta header required by the OAuth API surface.
const BETA_HEADER: &str = "oauth-2025-04-20";

/// Session window length (5 hours).
const SESSION_WINDOW_SECS: u64 = 5 * 60 * 60;

/// Weekly window length.
const WEEK_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

// ============================================================================
// Credentials
// ============================================================================

/// Shape of `~/.claude/.credentials.json`.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(rename = "claudeAiOauth")]
    oauth: OauthCredentials,
}

#[derive(Debug, Deserialize)]
struct OauthCredentials {
    #[serde(rename = "accessToken")]
    access_token: String,
    /// Expiry in milliseconds since the epoch.
    #[serde(rename = "expiresAt")]
    expires_at: Option<i64>,
}

// ============================================================================
// API Response Types
// ============================================================================

/// Response from the usage endpoint.
#[derive(Debug, Deserialize)]
pub struct ClaudeUsageResponse {
    /// Rolling 5-hour session window.
    pub five_hour: Option<ClaudeWindow>,
    /// Rolling 7-day window.
    pub seven_day: Option<ClaudeWindow>,
    /// Rolling 7-day window for the premium model tier.
    pub seven_day_opus: Option<ClaudeWindow>,
    /// Account info, when the token grants it.
    #[serde(default)]
    pub account: Option<ClaudeAccount>,
}

/// One usage window as reported by the API.
#[derive(Debug, Deserialize)]
pub struct ClaudeWindow {
    /// Percentage of the window used (0-100).
    pub utilization: f64,
    /// When the window resets.
    pub resets_at: Option<DateTime<Utc>>,
}

/// Account block of the usage response.
#[derive(Debug, Deserialize)]
pub struct ClaudeAccount {
    /// Account email address.
    pub email: Option<String>,
}

impl ClaudeWindow {
    fn to_window(&self, window_seconds: u64) -> UsageWindow {
        let mut window = UsageWindow::new(self.utilization).with_window_seconds(window_seconds);
        if let Some(resets_at) = self.resets_at {
            window = window.with_resets_at(resets_at);
        }
        window
    }
}

impl ClaudeUsageResponse {
    /// Normalizes the response into a usage result.
    pub fn into_result(self, now: DateTime<Utc>) -> ProviderUsageResult {
        let mut result = ProviderUsageResult::success(ProviderKind::Claude, now);

        if let Some(session) = &self.five_hour {
            result = result.with_primary_window(session.to_window(SESSION_WINDOW_SECS));
        }
        if let Some(week) = &self.seven_day {
            result = result.with_secondary_window(week.to_window(WEEK_WINDOW_SECS));
        }
        if let Some(opus) = &self.seven_day_opus {
            result = result.with_model_window(ModelUsage::new(
                "opus",
                opus.to_window(WEEK_WINDOW_SECS),
            ));
        }
        if let Some(email) = self.account.and_then(|a| a.email) {
            result = result.with_account_label(email);
        }

        result
    }
}

// ============================================================================
// Client
// ============================================================================

/// Claude provider client.
#[derive(Debug)]
pub struct ClaudeClient {
    http: reqwest::Client,
    credentials_path: std::path::PathBuf,
}

impl ClaudeClient {
    /// Creates a new client reading the Claude Code CLI credential file.
    pub fn new() -> Self {
        let credentials_path = dirs::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join(".claude")
            .join(".credentials.json");
        Self {
            http: http::build_client(),
            credentials_path,
        }
    }

    /// Loads the OAuth token, rejecting expired credentials locally.
    async fn load_token(&self, now: DateTime<Utc>) -> Result<String, ErrorState> {
        let raw = tokio::fs::read_to_string(&self.credentials_path)
            .await
            .map_err(|_| ErrorState::AuthNeeded)?;
        let credentials: CredentialsFile =
            serde_json::from_str(&raw).map_err(|_| ErrorState::AuthNeeded)?;

        if let Some(expires_ms) = credentials.oauth.expires_at {
            if let Some(expires_at) = Utc.timestamp_millis_opt(expires_ms).single() {
                if expires_at <= now {
                    return Err(ErrorState::TokenExpired);
                }
            }
        }
        Ok(credentials.oauth.access_token)
    }

    #[instrument(skip(self, token))]
    async fn fetch_parsed(&self, token: &str) -> Result<ClaudeUsageResponse, ErrorState> {
        debug!("fetching claude usage");
        let request = self
            .http
            .get(USAGE_URL)
            .bearer_auth(token)
            .header("anthropic-beta", BETA_HEADER);
        http::get_json(request).await
    }
}

impl Default for ClaudeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UsageProvider for ClaudeClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult {
        let token = match self.load_token(now).await {
            Ok(token) => token,
            Err(error) => return ProviderUsageResult::failure(ProviderKind::Claude, error, now),
        };
        match self.fetch_parsed(&token).await {
            Ok(response) => response.into_result(now),
            Err(error) => ProviderUsageResult::failure(ProviderKind::Claude, error, now),
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
            "five_hour": {"utilization": 12.5, "resets_at": "2026-08-07T18:00:00Z"},
            "seven_day": {"utilization": 48.0, "resets_at": "2026-08-11T00:00:00Z"},
            "seven_day_opus": {"utilization": 3.0, "resets_at": "2026-08-11T00:00:00Z"},
            "account": {"email": "dev@example.com"}
        }"#;

        let response: ClaudeUsageResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(Utc::now());

        let primary = result.primary_window.as_ref().unwrap();
        assert_eq!(primary.used_percent, 12.5);
        assert_eq!(primary.window_seconds, Some(SESSION_WINDOW_SECS));

        assert_eq!(
            result.secondary_window.as_ref().unwrap().used_percent,
            48.0
        );
        assert_eq!(result.per_model_windows.len(), 1);
        assert_eq!(result.per_model_windows[0].model, "opus");
        assert_eq!(result.account_label.as_deref(), Some("dev@example.com"));
        assert!(result.error_state.is_none());
        assert!(!result.is_stale);
    }

    #[test]
    fn test_parse_partial_response() {
        let json = r#"{"five_hour": {"utilization": 250.0}}"#;
        let response: ClaudeUsageResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result(Utc::now());

        // Out-of-range utilization is clamped at window construction.
        assert_eq!(result.primary_window.as_ref().unwrap().used_percent, 100.0);
        assert!(result.secondary_window.is_none());
        assert!(result.per_model_windows.is_empty());
        assert!(result.account_label.is_none());
    }

    #[test]
    fn test_parse_credentials_file() {
        let json = r#"{
            "claudeAiOauth": {
                "accessToken": "sk-ant-oat01-abc",
                "expiresAt": 1765000000000
            }
        }"#;
        let credentials: CredentialsFile = serde_json::from_str(json).unwrap();
        assert_eq!(credentials.oauth.access_token, "sk-ant-oat01-abc");
        assert!(credentials.oauth.expires_at.is_some());
    }
}
