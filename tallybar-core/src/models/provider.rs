//! Provider identifiers.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Tracked provider kinds.
///
/// This is the join key across fetch results, cache entries, and display
/// rows. The order of [`ProviderKind::all`] is the declaration order used
/// for snapshot rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Claude
    Claude,
    /// OpenAI Codex
    Codex,
    /// Google Gemini
    Gemini,
    /// z.ai
    Zai,
    /// Cerebras
    Cerebras,
    /// Moonshot Kimi
    Kimi,
    /// MiniMax
    Minimax,
}

impl ProviderKind {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Codex => "Codex",
            Self::Gemini => "Gemini",
            Self::Zai => "z.ai",
            Self::Cerebras => "Cerebras",
            Self::Kimi => "Kimi",
            Self::Minimax => "MiniMax",
        }
    }

    /// Returns the CLI name for this provider (lowercase, no spaces).
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
            Self::Zai => "zai",
            Self::Cerebras => "cerebras",
            Self::Kimi => "kimi",
            Self::Minimax => "minimax",
        }
    }

    /// Returns all provider kinds in declaration order.
    pub fn all() -> &'static [ProviderKind] {
        &[
            Self::Claude,
            Self::Codex,
            Self::Gemini,
            Self::Zai,
            Self::Cerebras,
            Self::Kimi,
            Self::Minimax,
        ]
    }

    /// Looks up a provider by its CLI name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownProvider`] when the name does not match
    /// any known provider.
    pub fn from_cli_name(name: &str) -> Result<Self, CoreError> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.cli_name() == name)
            .ok_or_else(|| CoreError::UnknownProvider(name.to_string()))
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(ProviderKind::Claude.display_name(), "Claude");
        assert_eq!(ProviderKind::Zai.display_name(), "z.ai");
    }

    #[test]
    fn test_from_cli_name() {
        assert_eq!(
            ProviderKind::from_cli_name("minimax").unwrap(),
            ProviderKind::Minimax
        );
        assert!(ProviderKind::from_cli_name("copilot").is_err());
    }

    #[test]
    fn test_all_unique() {
        let kinds = ProviderKind::all();
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }
}
