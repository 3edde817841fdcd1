// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Tallybar Providers
//!
//! Thin per-vendor clients implementing the [`tallybar_core::UsageProvider`]
//! contract: look up a credential, make one HTTP request, parse the
//! response, and normalize it into a `ProviderUsageResult`.
//!
//! Every client is infallible at the call boundary - all failure modes are
//! encoded as an `ErrorState` in the returned result. Each client owns its
//! own HTTP timeout; the aggregation engine imposes none.

pub mod cerebras;
pub mod claude;
pub mod codex;
pub mod gemini;
pub mod kimi;
pub mod minimax;
pub mod registry;
pub mod zai;

mod http;

pub use cerebras::CerebrasClient;
pub use claude::ClaudeClient;
pub use codex::CodexClient;
pub use gemini::GeminiClient;
pub use kimi::KimiClient;
pub use minimax::MinimaxClient;
pub use registry::default_providers;
pub use zai::ZaiClient;
