// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Tallybar Core
//!
//! Core types, models, and traits for the Tallybar application.
//!
//! This crate provides the foundational abstractions used across all other
//! Tallybar crates:
//!
//! - Domain models (providers, usage windows, fetch results, snapshots)
//! - The error-state taxonomy for failed fetches
//! - The [`UsageProvider`] contract provider clients implement
//!
//! ## Key Types
//!
//! - [`ProviderKind`] - Enum of all tracked providers
//! - [`UsageWindow`] - A single quota window (used percent + reset time)
//! - [`ErrorState`] / [`ErrorBadge`] - Failure taxonomy and display badge
//! - [`ProviderUsageResult`] - One provider's fetch outcome
//! - [`UsageSnapshot`] - The aggregate application state

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    ErrorBadge, ErrorState, ModelUsage, ProviderKind, ProviderUsageResult, UsageSnapshot,
    UsageWindow,
};

// Re-export traits
pub use traits::UsageProvider;
