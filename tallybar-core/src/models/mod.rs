//! Domain models for Tallybar.
//!
//! This module contains the core data structures representing providers,
//! usage windows, fetch results, and aggregate snapshots.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider identifiers
//! - [`usage`] - Usage windows and per-model usage
//! - [`status`] - Error states and display badges
//! - [`result`] - Per-provider fetch results and the aggregate snapshot

mod provider;
mod result;
mod status;
mod usage;

// Re-export everything at the models level
pub use provider::ProviderKind;
pub use result::{ProviderUsageResult, UsageSnapshot};
pub use status::{ErrorBadge, ErrorState};
pub use usage::{ModelUsage, UsageWindow};
