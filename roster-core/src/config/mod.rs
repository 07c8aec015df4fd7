//! Configuration management for Roster
//!
//! Defaults, environment overrides and TOML files, validated before use.

use crate::groups::id_generator::DEFAULT_MAX_ATTEMPTS;
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persistence configuration
    pub store: StoreConfig,

    /// Group store behaviour
    pub groups: GroupsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Persistence backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Non-persistent, process-local
    Memory,
    /// SQLite database file
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(ConfigError::InvalidValue {
                key: "store.backend".to_string(),
                reason: format!("unknown storage backend '{}'", other),
            }),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which backend to open
    pub backend: StorageBackend,

    /// SQLite database path
    pub db_path: PathBuf,

    /// Maximum pooled SQLite connections
    pub pool_size: u32,

    /// How long a connection waits on a locked database
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

/// Group store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupsConfig {
    /// Random id candidates drawn before giving up on creation
    pub max_id_attempts: usize,

    /// Hold a per-group guard across each read-modify-write
    pub serialize_mutations: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            db_path: PathBuf::from("./data/groups.db"),
            pool_size: 8,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            max_id_attempts: DEFAULT_MAX_ATTEMPTS,
            serialize_mutations: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: ROSTER_<SECTION>_<KEY>
    /// Example: ROSTER_STORE_DB_PATH=/var/lib/roster/groups.db
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ROSTER_*` overrides resolved through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Store config
        if let Some(backend) = lookup("ROSTER_STORE_BACKEND") {
            self.store.backend = backend.parse()?;
        }
        if let Some(path) = lookup("ROSTER_STORE_DB_PATH") {
            self.store.db_path = PathBuf::from(path);
        }
        if let Some(size) = lookup("ROSTER_STORE_POOL_SIZE") {
            self.store.pool_size = parse_var("ROSTER_STORE_POOL_SIZE", &size)?;
        }
        if let Some(timeout) = lookup("ROSTER_STORE_BUSY_TIMEOUT") {
            self.store.busy_timeout =
                humantime::parse_duration(&timeout).map_err(|e| ConfigError::InvalidValue {
                    key: "ROSTER_STORE_BUSY_TIMEOUT".to_string(),
                    reason: e.to_string(),
                })?;
        }

        // Groups config
        if let Some(attempts) = lookup("ROSTER_GROUPS_MAX_ID_ATTEMPTS") {
            self.groups.max_id_attempts = parse_var("ROSTER_GROUPS_MAX_ID_ATTEMPTS", &attempts)?;
        }
        if let Some(serialize) = lookup("ROSTER_GROUPS_SERIALIZE_MUTATIONS") {
            self.groups.serialize_mutations = parse_var("ROSTER_GROUPS_SERIALIZE_MUTATIONS", &serialize)?;
        }

        // Logging config
        if let Some(level) = lookup("ROSTER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("ROSTER_LOG_JSON") {
            self.logging.json_format = parse_var("ROSTER_LOG_JSON", &json)?;
        }

        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.pool_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "pool_size must be greater than 0".to_string(),
            ));
        }

        if self.groups.max_id_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_id_attempts must be greater than 0".to_string(),
            ));
        }

        if let Err(e) = self.logging.level.parse::<LogLevel>() {
            return Err(ConfigError::ValidationFailed(e.to_string()));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        let path = path.as_ref();
        std::fs::write(path, contents).map_err(|source| ConfigError::FileWriteError {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.groups.max_id_attempts, DEFAULT_MAX_ATTEMPTS);
        assert!(config.groups.serialize_mutations);
        assert_eq!(config.store.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.store.pool_size = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.groups.max_id_attempts = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("ROSTER_STORE_BACKEND", "memory"),
                ("ROSTER_STORE_BUSY_TIMEOUT", "250ms"),
                ("ROSTER_GROUPS_MAX_ID_ATTEMPTS", "3"),
                ("ROSTER_GROUPS_SERIALIZE_MUTATIONS", "false"),
                ("ROSTER_LOG_LEVEL", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.store.backend, StorageBackend::Memory);
        assert_eq!(config.store.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.groups.max_id_attempts, 3);
        assert!(!config.groups.serialize_mutations);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut config = Config::default();
        let result = config.apply_overrides(lookup_from(&[("ROSTER_STORE_POOL_SIZE", "many")]));
        assert!(
            matches!(result, Err(ConfigError::InvalidValue { ref key, .. }) if key == "ROSTER_STORE_POOL_SIZE")
        );

        let result = config.apply_overrides(lookup_from(&[("ROSTER_STORE_BACKEND", "redis")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_log_level_validation_matches_parser() {
        let mut config = Config::default();
        for level in ["WARN", "Debug", "warning", "error"] {
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "level {} rejected", level);
        }

        config.logging.level = "verbose".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        match Config::from_file(&path) {
            Err(ConfigError::FileReadError { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected FileReadError, got {:?}", other),
        }
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.toml");

        let mut config = Config::default();
        config.store.backend = StorageBackend::Memory;
        config.groups.max_id_attempts = 5;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.store.backend, StorageBackend::Memory);
        assert_eq!(loaded.groups.max_id_attempts, 5);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.toml");
        std::fs::write(&path, "[groups]\nmax_id_attempts = 2\n").unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.groups.max_id_attempts, 2);
        assert!(loaded.groups.serialize_mutations);
        assert_eq!(loaded.store.pool_size, 8);
    }
}
