//! Shared HTTP plumbing for provider clients.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::warn;

use tallybar_core::ErrorState;

/// Per-request timeout. Provider clients own their timeouts; the engine
/// imposes none.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Builds the HTTP client shared by a provider.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized; the client cannot
/// function without HTTP.
pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("tallybar/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client")
}

/// Sends a prepared request and decodes the JSON body, mapping every
/// failure mode to the error-state taxonomy:
///
/// - transport failure (DNS, timeout, reset) -> `NetworkError`
/// - HTTP 401/403 -> `TokenExpired`
/// - other non-success status -> `EndpointError`
/// - undecodable body -> `ParseError`
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ErrorState> {
    let response = request
        .send()
        .await
        .map_err(|e| ErrorState::NetworkError(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ErrorState::TokenExpired);
    }
    if !status.is_success() {
        return Err(ErrorState::EndpointError(format!("HTTP {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ErrorState::NetworkError(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| {
        warn!(error = %e, "unexpected response shape");
        ErrorState::ParseError(e.to_string())
    })
}

/// Reads an API key from the environment, treating empty values as unset.
pub(crate) fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|value| !value.is_empty())
}
