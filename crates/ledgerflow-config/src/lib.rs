//! Configuration management for ledgerflow
//!
//! This module handles loading, validation, and management of
//! ledgerflow configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::{ConfigError, ConfigResult};

/// Environment variable that overrides `database.url`
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Relational store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection before failing the request
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: 0,
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

fn default_database_url() -> String {
    "postgres://localhost/ledgerflow".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    3
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a cached result set in milliseconds
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
        }
    }
}

fn default_ttl_ms() -> u64 {
    3_600_000
}

/// Report export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Absolute base URL used for download links (e.g. "https://books.example.com").
    /// When unset the request's Host header is used.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Symbol printed in front of amounts in PDF reports
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// Number of decimal places for amounts
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            public_base_url: None,
            currency_symbol: default_currency_symbol(),
            decimal_places: default_decimal_places(),
        }
    }
}

fn default_currency_symbol() -> String {
    "Rs.".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::IoError)?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from YAML text without validating it
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(content).map_err(|_| ConfigError::InvalidYaml)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; blank values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.database.url = url;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.url".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections".to_string(),
                reason: "At least one connection is required".to_string(),
            });
        }

        if self.cache.ttl_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_ms".to_string(),
                reason: "Cache TTL must be greater than 0".to_string(),
            });
        }

        if self.export.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "export.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        if let Some(ref base) = self.export.public_base_url {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    field: "export.public_base_url".to_string(),
                    reason: "Base URL must start with http:// or https://".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl_ms, 3_600_000);
        assert_eq!(config.server.port, 8081);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = Config::from_yaml("server:\n  port: 9000\ncache:\n  ttl_ms: 500\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.ttl_ms, 500);
        assert_eq!(config.export.currency_symbol, "Rs.");
    }

    #[test]
    fn test_default_template_parses() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = Config::default();
        config.cache.ttl_ms = 0;
        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "cache.ttl_ms"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_base_url_must_be_http() {
        let mut config = Config::default();
        config.export.public_base_url = Some("books.example.com".to_string());
        assert!(config.validate().is_err());

        config.export.public_base_url = Some("https://books.example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(Config::from_yaml("server: [oops"), Err(ConfigError::InvalidYaml)));
    }

    #[test]
    fn test_overrides_replace_database_url() {
        let mut config = Config::default();
        let default_url = config.database.url.clone();

        config.apply_overrides(|_| None);
        assert_eq!(config.database.url, default_url);

        config.apply_overrides(|_| Some("   ".to_string()));
        assert_eq!(config.database.url, default_url);

        config.apply_overrides(|key| (key == DATABASE_URL_ENV).then(|| "postgres://ci@db/books".to_string()));
        assert_eq!(config.database.url, "postgres://ci@db/books");
    }

    #[test]
    fn test_load_applies_database_url_env() {
        let path = std::env::temp_dir().join(format!("ledgerflow-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "database:\n  url: postgres://file@localhost/books\n").unwrap();

        std::env::set_var(DATABASE_URL_ENV, "postgres://env@db/books");
        let loaded = Config::load(path.clone());
        std::env::remove_var(DATABASE_URL_ENV);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.unwrap().database.url, "postgres://env@db/books");
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(PathBuf::from("/definitely/not/here.yaml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }
}
