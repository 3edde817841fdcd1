//! Last-known-good result cache.

use std::collections::HashMap;

use tallybar_core::{ProviderKind, ProviderUsageResult};

/// Per-provider store of the last successful fetch result.
///
/// Written only on success and never evicted; it lives for the process
/// lifetime and is bounded by the fixed provider set. The cache has no
/// locking of its own - it is owned by the aggregator's serialized state.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<ProviderKind, ProviderUsageResult>,
}

impl ResultCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached success for a provider, if any.
    pub fn get(&self, provider: ProviderKind) -> Option<&ProviderUsageResult> {
        self.entries.get(&provider)
    }

    /// Stores a successful result for its provider.
    pub fn put(&mut self, result: ProviderUsageResult) {
        debug_assert!(result.error_state.is_none(), "only successes are cached");
        self.entries.insert(result.provider, result);
    }

    /// Number of providers with a cached success.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no provider has succeeded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
