//! Provider registry.

use std::sync::Arc;

use tallybar_core::{ProviderKind, UsageProvider};

use crate::{
    CerebrasClient, ClaudeClient, CodexClient, GeminiClient, KimiClient, MinimaxClient,
    ZaiClient,
};

/// Builds a client for one provider kind.
pub fn client_for(kind: ProviderKind) -> Arc<dyn UsageProvider> {
    match kind {
        ProviderKind::Claude => Arc::new(ClaudeClient::new()),
        ProviderKind::Codex => Arc::new(CodexClient::new()),
        ProviderKind::Gemini => Arc::new(GeminiClient::new()),
        ProviderKind::Zai => Arc::new(ZaiClient::new()),
        ProviderKind::Cerebras => Arc::new(CerebrasClient::new()),
        ProviderKind::Kimi => Arc::new(KimiClient::new()),
        ProviderKind::Minimax => Arc::new(MinimaxClient::new()),
    }
}

/// Builds the full default provider list, in declaration order.
pub fn default_providers() -> Vec<Arc<dyn UsageProvider>> {
    ProviderKind::all().iter().copied().map(client_for).collect()
}

// ============================================================================
// Tests
// ============================================================================
