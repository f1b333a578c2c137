//! Matcher configuration.
//!
//! A flat record with built-in defaults. The settings surface that edits
//! it is out of scope; this module only loads, saves, and validates.

use crate::dom::selector::{Selector, SelectorError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use triage_protocol::defaults::{DEFAULT_API_URL, DEFAULT_ERROR_SELECTOR, DEFAULT_ROW_SELECTOR};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Invalid selector '{selector}': {source}")]
    Selector {
        selector: String,
        source: SelectorError,
    },
}

/// User configuration for the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Base URL of the known-issues store.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Selector identifying candidate failure rows.
    #[serde(default = "default_row_selector")]
    pub row_selector: String,

    /// Selector identifying error text containers.
    #[serde(default = "default_error_selector")]
    pub error_selector: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_row_selector() -> String {
    DEFAULT_ROW_SELECTOR.to_string()
}

fn default_error_selector() -> String {
    DEFAULT_ERROR_SELECTOR.to_string()
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            row_selector: default_row_selector(),
            error_selector: default_error_selector(),
        }
    }
}

impl MatcherConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parse both selectors. Called once at the start of every scan;
    /// selector edits take effect at the next scan, never mid-scan.
    pub fn validate(&self) -> Result<ScanSelectors, ConfigError> {
        let row = Selector::parse(&self.row_selector).map_err(|source| ConfigError::Selector {
            selector: self.row_selector.clone(),
            source,
        })?;
        let error = Selector::parse(&self.error_selector).map_err(|source| ConfigError::Selector {
            selector: self.error_selector.clone(),
            source,
        })?;
        Ok(ScanSelectors { row, error })
    }
}

/// The selector pair a single scan runs with.
#[derive(Debug, Clone)]
pub struct ScanSelectors {
    pub row: Selector,
    pub error: Selector,
}

impl ScanSelectors {
    /// The built-in selector pair. The defaults are static strings that
    /// are covered by tests, so this cannot fail at runtime.
    pub fn built_in() -> Self {
        MatcherConfig::default()
            .validate()
            .unwrap_or_else(|e| panic!("built-in selectors must parse: {e}"))
    }
}

/// Source of the current configuration record. Implementations decide
/// where the record lives; the orchestrator re-reads it at every scan.
pub trait ConfigProvider: Send + Sync {
    fn load(&self) -> MatcherConfig;
}

/// Fixed in-memory configuration.
pub struct StaticConfigProvider(pub MatcherConfig);

impl ConfigProvider for StaticConfigProvider {
    fn load(&self) -> MatcherConfig {
        self.0.clone()
    }
}

/// TOML-file-backed configuration. A missing file yields the defaults; a
/// malformed file logs and yields the defaults rather than blocking scans.
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `~/.triage/config.toml`.
    pub fn default_location() -> Self {
        Self::new(triage_logging::triage_home().join("config.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for FileConfigProvider {
    fn load(&self) -> MatcherConfig {
        if !self.path.exists() {
            return MatcherConfig::default();
        }
        match MatcherConfig::load(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to load config; using defaults");
                MatcherConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = MatcherConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: MatcherConfig =
            toml::from_str(r#"api_url = "http://ci.internal:9000/known-issues""#).unwrap();
        assert_eq!(config.api_url, "http://ci.internal:9000/known-issues");
        assert_eq!(config.row_selector, DEFAULT_ROW_SELECTOR);
        assert_eq!(config.error_selector, DEFAULT_ERROR_SELECTOR);
    }

    #[test]
    fn test_validate_rejects_bad_selector() {
        let config = MatcherConfig {
            row_selector: "div > span".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Selector { .. })
        ));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = MatcherConfig {
            api_url: "http://localhost:4000/known-issues".to_string(),
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = MatcherConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_file_provider_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("nope.toml"));
        assert_eq!(provider.load(), MatcherConfig::default());
    }
}
