//! Runtime configuration for catalog hosts.
//!
//! # Responsibility
//! - Describe where the database and logs live and the default page size.
//! - Load settings from a JSON document or from `CATALOG_*` environment variables.
//!
//! # Invariants
//! - A validated config has a positive page size and a supported log level.
//! - Absent `db_path` means an in-memory database.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, normalize_level, LoggingError};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "CATALOG_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CATALOG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CATALOG_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "CATALOG_PAGE_SIZE";

const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidValue { key: &'static str, value: String },
    Logging(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
            Self::Logging(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<LoggingError> for ConfigError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Logging stays disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub default_page_size: i64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogConfig {
    /// Parses and validates a JSON config; missing keys take defaults.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a config from `CATALOG_*` variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CatalogConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(ENV_DB_PATH).filter(|value| !value.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|value| !value.trim().is_empty()) {
            config.log_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE) {
            config.default_page_size =
                size.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_PAGE_SIZE,
                        value: size.clone(),
                    })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(|_| ConfigError::InvalidValue {
            key: "log_level",
            value: self.log_level.clone(),
        })?;
        if self.default_page_size <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "default_page_size",
                value: self.default_page_size.to_string(),
            });
        }
        Ok(())
    }

    /// Starts file logging when `log_dir` is configured.
    pub fn init_logging(&self) -> Result<bool, ConfigError> {
        match &self.log_dir {
            Some(dir) => {
                init_logging(&self.log_level, dir)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Opens the configured database with migrations applied.
    pub fn open_db(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn json_config_fills_missing_keys_with_defaults() {
        let config = CatalogConfig::from_json_str(r#"{ "default_page_size": 5 }"#).unwrap();
        assert_eq!(config.default_page_size, 5);
        assert_eq!(config.db_path, None);
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn json_config_rejects_non_positive_page_size() {
        let err = CatalogConfig::from_json_str(r#"{ "default_page_size": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "default_page_size",
                ..
            }
        ));
    }

    #[test]
    fn json_config_rejects_unknown_level_and_malformed_input() {
        assert!(matches!(
            CatalogConfig::from_json_str(r#"{ "log_level": "loud" }"#),
            Err(ConfigError::InvalidValue { key: "log_level", .. })
        ));
        assert!(matches!(
            CatalogConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn lookup_reads_catalog_variables() {
        let vars = HashMap::from([
            (ENV_DB_PATH, "/tmp/catalog.db"),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_PAGE_SIZE, " 7 "),
        ]);
        let config =
            CatalogConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()))
                .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/catalog.db")));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
        assert_eq!(config.default_page_size, 7);
    }

    #[test]
    fn lookup_rejects_unparseable_page_size() {
        let err = CatalogConfig::from_lookup(|key| {
            (key == ENV_PAGE_SIZE).then(|| "ten".to_string())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_PAGE_SIZE,
                ..
            }
        ));
    }

    #[test]
    fn config_without_log_dir_skips_logging() {
        assert!(!CatalogConfig::default().init_logging().unwrap());
    }

    #[test]
    fn config_without_db_path_opens_in_memory() {
        let conn = CatalogConfig::default().open_db().unwrap();
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, crate::db::migrations::latest_version());
    }
}
