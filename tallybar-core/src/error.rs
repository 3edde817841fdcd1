//! Core error types for Tallybar.

use thiserror::Error;

/// Core error type for Tallybar operations.
///
/// Fetch failures are not errors at this level: a provider client encodes
/// those as [`crate::ErrorState`] inside its returned result. This type
/// covers lookup and construction faults only.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Provider name did not match any known provider.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}
