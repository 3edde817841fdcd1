//! Error states and display badges.

use serde::{Deserialize, Serialize};

// ============================================================================
// Error State
// ============================================================================

/// Failure taxonomy for a provider fetch.
///
/// Provider clients never return `Err`; every failure mode is captured as
/// one of these variants inside the returned result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ErrorState {
    /// No usable credential found.
    AuthNeeded,
    /// Credential present but rejected as expired (e.g., HTTP 401/403).
    TokenExpired,
    /// Remote service returned a non-success status.
    EndpointError(String),
    /// Response payload did not match the expected shape.
    ParseError(String),
    /// Transport-level failure: DNS, timeout, connection reset.
    NetworkError(String),
}

impl ErrorState {
    /// Returns the display badge for this error.
    ///
    /// Endpoint errors whose message looks auth-related (401/403,
    /// "invalid", "rejected") are shown under the auth badge; the
    /// underlying variant is preserved.
    pub fn badge(&self) -> ErrorBadge {
        match self {
            Self::AuthNeeded => ErrorBadge::AuthNeeded,
            Self::TokenExpired => ErrorBadge::TokenExpired,
            Self::EndpointError(message) if looks_auth_related(message) => ErrorBadge::AuthNeeded,
            Self::EndpointError(_) => ErrorBadge::Endpoint,
            Self::ParseError(_) => ErrorBadge::Parse,
            Self::NetworkError(_) => ErrorBadge::Network,
        }
    }

    /// Returns the longer human-readable detail string.
    pub fn detail(&self) -> String {
        match self {
            Self::AuthNeeded => "No credentials found. Sign in to the provider.".to_string(),
            Self::TokenExpired => "Credentials were rejected as expired.".to_string(),
            Self::EndpointError(message) => format!("Provider returned an error: {message}"),
            Self::ParseError(message) => format!("Could not read the provider response: {message}"),
            Self::NetworkError(message) => format!("Network failure: {message}"),
        }
    }
}

impl std::fmt::Display for ErrorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail())
    }
}

fn looks_auth_related(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("401")
        || lowered.contains("403")
        || lowered.contains("invalid")
        || lowered.contains("rejected")
}

// ============================================================================
// Error Badge
// ============================================================================

/// Short display classification derived from an [`ErrorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorBadge {
    /// Sign-in required.
    AuthNeeded,
    /// Credential expired.
    TokenExpired,
    /// Remote endpoint failure.
    Endpoint,
    /// Unreadable response.
    Parse,
    /// Transport failure.
    Network,
}

impl ErrorBadge {
    /// Returns a short label for the badge.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AuthNeeded => "Sign in",
            Self::TokenExpired => "Expired",
            Self::Endpoint => "API error",
            Self::Parse => "Bad response",
            Self::Network => "Offline",
        }
    }
}

impl std::fmt::Display for ErrorBadge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Tests
// ============================================================================
