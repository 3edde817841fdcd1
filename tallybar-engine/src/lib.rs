// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Tallybar Engine
//!
//! The polling and aggregation engine: fans out concurrent per-provider
//! fetches on a fixed interval, merges results with stale-data fallback,
//! and publishes a live snapshot stream to any number of observers.
//!
//! ## Usage
//!
//! ```ignore
//! use std::time::Duration;
//! use tallybar_engine::UsageAggregator;
//! use tallybar_providers::default_providers;
//!
//! let aggregator = UsageAggregator::new(default_providers(), Duration::from_secs(60))?;
//! aggregator.start();
//!
//! let mut subscription = aggregator.subscribe().await;
//! while let Some(snapshot) = subscription.next().await {
//!     println!("{} providers reporting", snapshot.results.len());
//! }
//! ```

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod hub;

pub use aggregator::{DEFAULT_POLL_INTERVAL, UsageAggregator};
pub use cache::ResultCache;
pub use error::EngineError;
pub use hub::{Subscription, SubscriptionHub};
