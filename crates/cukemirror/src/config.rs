//! Resolved runtime configuration.
//!
//! Sources, lowest to highest priority: built-in defaults, `<home>/config.toml`,
//! then command-line flags (which clap also fills from `CUKEMIRROR_*` env vars).

use anyhow::{Context, Result};
use cukemirror_db::ReplaceStrategy;
use cukemirror_protocol::paths::{config_file_path, default_store_path};
use cukemirror_upstream::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub upstream: UpstreamConfig,
    pub store: StoreConfig,
    pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Defaults to `<home>/mirror.sqlite`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub strategy: ReplaceStrategy,
}

/// Values given on the command line. `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub db_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub strategy: Option<ReplaceStrategy>,
}

impl MirrorConfig {
    /// Load a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `<home>/config.toml` and apply command-line overrides.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let mut config = Self::load_from(&config_file_path())?;
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(path) = overrides.db_path {
            self.store.path = Some(path);
        }
        if let Some(base_url) = overrides.base_url {
            self.upstream.base_url = base_url;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.upstream.timeout_secs = timeout_secs;
        }
        if let Some(strategy) = overrides.strategy {
            self.refresh.strategy = strategy;
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.store.path.clone().unwrap_or_else(default_store_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = MirrorConfig::load_from(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config, MirrorConfig::default());
        assert_eq!(config.upstream.base_url, "https://studio.cucumber.io/api");
        assert_eq!(config.upstream.timeout_secs, 30);
        assert_eq!(config.refresh.strategy, ReplaceStrategy::Atomic);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[upstream]\ntimeout_secs = 5\n\n[refresh]\nstrategy = \"best_effort\"\n",
        )
        .unwrap();

        let config = MirrorConfig::load_from(&path).unwrap();
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.refresh.strategy, ReplaceStrategy::BestEffort);
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[refresh]\nstrategy = \"sometimes\"\n").unwrap();
        assert!(MirrorConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = MirrorConfig::default();
        config.apply(Overrides {
            db_path: Some(PathBuf::from("/tmp/m.sqlite")),
            base_url: Some("http://localhost:1/api".to_string()),
            timeout_secs: Some(0),
            strategy: None,
        });

        assert_eq!(config.store_path(), PathBuf::from("/tmp/m.sqlite"));
        assert_eq!(config.upstream.base_url, "http://localhost:1/api");
        assert_eq!(config.upstream.timeout(), Duration::from_secs(1));
        assert_eq!(config.refresh.strategy, ReplaceStrategy::Atomic);
    }
}
