//! Engine error types.

use tallybar_core::ProviderKind;
use thiserror::Error;

/// Errors that can occur while constructing the engine.
///
/// There are no runtime fetch errors at this level: provider failures are
/// carried as data inside snapshots, never raised.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Two provider clients declared the same identity.
    #[error("Duplicate provider identity: {0}")]
    DuplicateProvider(ProviderKind),

    /// The aggregator was handed an empty provider list.
    #[error("No providers registered")]
    NoProviders,
}
