//! Data source configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::params::SourceParams;
use crate::source_type::SourceType;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a data source decides whether a `get` should reach its caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RefreshMode {
    /// Refresh on every request.
    #[default]
    Always,
    /// Refresh only while nothing is stored for the default params.
    WhenEmpty,
    /// Refresh at most once per interval.
    MinInterval {
        /// Minimum time between refreshes, in milliseconds.
        interval_ms: u64,
    },
}

impl RefreshMode {
    /// Create a min-interval mode from a duration.
    pub fn min_interval(interval: Duration) -> Self {
        Self::MinInterval {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Configuration for a single data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Where this source's data comes from.
    pub origin: SourceType,
    /// Params substituted when a request passes none.
    #[serde(default)]
    pub default_params: SourceParams,
    /// Refresh behavior.
    #[serde(default)]
    pub refresh: RefreshMode,
}

impl SourceConfig {
    /// Create a config for the given origin with defaults.
    pub fn new(origin: SourceType) -> Self {
        Self {
            origin,
            default_params: SourceParams::default(),
            refresh: RefreshMode::default(),
        }
    }

    /// Set the default params.
    pub fn with_default_params(mut self, params: SourceParams) -> Self {
        self.default_params = params;
        self
    }

    /// Set the refresh mode.
    pub fn with_refresh(mut self, refresh: RefreshMode) -> Self {
        self.refresh = refresh;
        self
    }

    /// Parse a config from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a config from JSON.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_toml_minimal() {
        let config = SourceConfig::from_toml_str(r#"origin = "disk""#).unwrap();
        assert_eq!(config, SourceConfig::new(SourceType::Disk));
    }

    #[test]
    fn test_config_toml_full() {
        let config = SourceConfig::from_toml_str(
            r#"
origin = "network"

[default_params]
data = "latest"
force = false

[refresh]
mode = "min_interval"
interval_ms = 1500
"#,
        )
        .unwrap();

        assert_eq!(config.origin, SourceType::Network);
        assert_eq!(config.default_params.cache_key(), "latest");
        assert_eq!(
            config.refresh,
            RefreshMode::min_interval(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_config_json() {
        let config =
            SourceConfig::from_json_str(r#"{"origin":"memory","refresh":{"mode":"when_empty"}}"#)
                .unwrap();
        assert_eq!(config.origin, SourceType::Memory);
        assert_eq!(config.refresh, RefreshMode::WhenEmpty);
    }

    #[test]
    fn test_config_invalid_origin() {
        let result = SourceConfig::from_toml_str(r#"origin = "carrier-pigeon""#);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // === File Loading Tests ===

    #[test]
    fn test_config_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("source.toml");
        std::fs::write(&toml_path, "origin = \"disk\"\n").unwrap();
        assert_eq!(SourceConfig::load(&toml_path).unwrap().origin, SourceType::Disk);

        let json_path = dir.path().join("source.json");
        std::fs::write(&json_path, r#"{"origin":"network"}"#).unwrap();
        assert_eq!(
            SourceConfig::load(&json_path).unwrap().origin,
            SourceType::Network
        );
    }

    #[test]
    fn test_min_interval_saturates_huge_duration() {
        assert_eq!(
            RefreshMode::min_interval(Duration::MAX),
            RefreshMode::MinInterval {
                interval_ms: u64::MAX
            }
        );
        assert_eq!(
            RefreshMode::min_interval(Duration::from_secs(2)),
            RefreshMode::MinInterval { interval_ms: 2000 }
        );
    }

    #[test]
    fn test_config_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SourceConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
