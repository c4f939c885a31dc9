//! Configuration management for mdapi.
//!
//! Handles loading, saving, and validating configuration from the
//! platform-specific config directory.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Application name used for config directory.
const APP_NAME: &str = "mdapi";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Default credential filename, next to the config file.
const CREDENTIALS_FILENAME: &str = "credentials.json";

/// Largest page size any listing endpoint accepts.
pub const MAX_PAGE_LIMIT: usize = 500;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service connection settings.
    pub api: ApiConfig,

    /// Page sizes for listing endpoints.
    pub pagination: PaginationConfig,

    /// File paths.
    pub paths: PathsConfig,
}

/// Service connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every relative endpoint path is joined to.
    pub base_url: String,

    /// User-Agent header sent with every request.
    pub user_agent: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mangadex.org".to_string(),
            user_agent: format!("mdapi/{} (Rust)", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

/// Page size configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size for searches and listings.
    pub default_limit: usize,

    /// Page size for chapter feeds.
    pub feed_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            feed_limit: 500,
        }
    }
}

/// File path configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where the saved session lives. Defaults to the config directory.
    pub credentials_file: Option<PathBuf>,
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "api.base_url".to_string(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: "api.base_url".to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        for (key, limit) in [
            ("pagination.default_limit", self.pagination.default_limit),
            ("pagination.feed_limit", self.pagination.feed_limit),
        ] {
            if limit == 0 || limit > MAX_PAGE_LIMIT {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("must be between 1 and {MAX_PAGE_LIMIT}"),
                });
            }
        }

        Ok(())
    }

    /// Returns the effective credentials file, using config or default.
    pub fn credentials_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.credentials_file {
            Ok(path.clone())
        } else {
            Ok(Self::config_dir()?.join(CREDENTIALS_FILENAME))
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.mangadex.org");
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.feed_limit, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = Config::default();
        config.pagination.default_limit = 25;
        config.paths.credentials_file = Some(PathBuf::from("/tmp/creds.json"));
        let file = NamedTempFile::new().unwrap();

        config.save_to(file.path()).unwrap();

        let loaded = Config::load_from(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_creates_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[api]\ntimeout_secs = 5\n").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.base_url, "https://api.mangadex.org");
        assert_eq!(config.pagination, PaginationConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[api\n").unwrap();
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.api.base_url = "ftp://example.org".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pagination.feed_limit = 501;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "pagination.feed_limit"
        ));
    }

    #[test]
    fn test_credentials_path_override() {
        let mut config = Config::default();
        config.paths.credentials_file = Some(PathBuf::from("/tmp/x.json"));
        assert_eq!(config.credentials_path().unwrap(), PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn test_base_url_trims_slash() {
        let mut config = Config::default();
        config.api.base_url = "https://api.example.org/".to_string();
        assert_eq!(config.base_url(), "https://api.example.org");
    }
}
