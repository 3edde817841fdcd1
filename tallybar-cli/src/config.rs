//! Configuration management.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tallybar_core::ProviderKind;
use tracing::{debug, info};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Provider-specific configuration, keyed by CLI name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Refresh interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether this provider is polled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tallybar")
            .join("config.json")
    }

    /// Loads configuration from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Returns whether a provider is enabled.
    pub fn is_provider_enabled(&self, kind: ProviderKind) -> bool {
        self.providers
            .get(kind.cli_name())
            .is_none_or(|p| p.enabled)
    }

    /// Returns the poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.general.refresh_interval.max(1))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert!(config.is_provider_enabled(ProviderKind::Claude));
    }

    #[test]
    fn test_parse_with_disabled_provider() {
        let json = r#"{
            "general": {"refresh_interval": 120},
            "providers": {"kimi": {"enabled": false}}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.poll_interval(), Duration::from_secs(120));
        assert!(!config.is_provider_enabled(ProviderKind::Kimi));
        assert!(config.is_provider_enabled(ProviderKind::Claude));
    }

    #[test]
    fn test_zero_interval_is_floored() {
        let json = r#"{"general": {"refresh_interval": 0}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}
