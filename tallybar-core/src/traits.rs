//! Trait definitions for Tallybar.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ProviderKind, ProviderUsageResult};

/// Contract implemented by every provider client.
///
/// Implementors are responsible for authenticating with the provider's API,
/// fetching current usage, and normalizing the response. The trait is
/// object-safe so the aggregator can hold a heterogeneous provider list.
///
/// `fetch_usage` is infallible by contract: all failure modes (missing
/// credentials, HTTP errors, unparseable payloads) are encoded as an
/// [`crate::ErrorState`] inside the returned result. A client manages its
/// own request timeout; the aggregator imposes none.
#[async_trait]
pub trait UsageProvider: Send + Sync {
    /// Returns the kind of provider this client handles.
    fn kind(&self) -> ProviderKind;

    /// Returns the display name for this provider.
    fn display_name(&self) -> &'static str {
        self.kind().display_name()
    }

    /// Fetches current usage.
    ///
    /// `now` is the refresh cycle's start time and becomes the result's
    /// `observed_at`. Never set `is_stale` here; staleness is an
    /// aggregator-side derivation.
    async fn fetch_usage(&self, now: DateTime<Utc>) -> ProviderUsageResult;
}
