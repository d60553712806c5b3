//! Core runtime configuration.
//!
//! # Responsibility
//! - Resolve database path and logging settings for hosts and the CLI.
//! - Layer sources: built-in defaults, optional JSON file, then environment.
//!
//! # Invariants
//! - `db_path` is never blank after `validate()`.
//! - `log_dir`, when set, is absolute (required by `init_logging`).

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "FLEETDESK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "FLEETDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "FLEETDESK_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "fleetdesk.sqlite3";
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];

/// Configuration loading/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Runtime settings for one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Rolling log directory. File logging is off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Parses a JSON document; missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Loads defaults, then `path` when given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as [`CoreConfig::load`] with an explicit override lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a key lookup, normally the process environment.
    ///
    /// Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(value) = read(ENV_DB_PATH) {
            self.db_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
        }
        let level = self.log_level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unsupported log level `{}`",
                self.log_level
            )));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = CoreConfig::from_json_str(r#"{ "db_path": "/var/lib/fleet.db" }"#).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/fleet.db"));
        assert_eq!(config.log_level, CoreConfig::default().log_level);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn overrides_replace_values_and_skip_blank() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DB_PATH, "/tmp/override.db"),
            (ENV_LOG_LEVEL, "  "),
            (ENV_LOG_DIR, "/tmp/logs"),
        ]);
        let mut config = CoreConfig::default();
        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.db_path, PathBuf::from("/tmp/override.db"));
        assert_eq!(config.log_level, CoreConfig::default().log_level);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/logs")));
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_relative_log_dir_and_unknown_level() {
        let mut config = CoreConfig {
            log_dir: Some(PathBuf::from("logs")),
            ..CoreConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("absolute"));

        config.log_dir = None;
        config.log_level = "loud".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("loud"));
    }

    #[test]
    fn load_reads_file_then_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetdesk.json");
        std::fs::write(
            &path,
            r#"{ "db_path": "/srv/fleet.db", "log_level": "warn" }"#,
        )
        .unwrap();

        let from_file = CoreConfig::load_with(Some(path.as_path()), no_env).unwrap();
        assert_eq!(from_file.db_path, PathBuf::from("/srv/fleet.db"));
        assert_eq!(from_file.log_level, "warn");

        let env: HashMap<&str, &str> = HashMap::from([(ENV_LOG_LEVEL, "error")]);
        let overridden =
            CoreConfig::load_with(Some(path.as_path()), |key| env.get(key).map(|v| v.to_string()))
                .unwrap();
        assert_eq!(overridden.db_path, PathBuf::from("/srv/fleet.db"));
        assert_eq!(overridden.log_level, "error");
    }

    #[test]
    fn load_reports_missing_file_as_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        match CoreConfig::load_with(Some(path.as_path()), no_env).unwrap_err() {
            ConfigError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_reports_malformed_json_as_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ db_path: ").unwrap();
        assert!(matches!(
            CoreConfig::load_with(Some(path.as_path()), no_env).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn load_without_file_validates_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([(ENV_LOG_DIR, "relative/logs")]);
        assert!(matches!(
            CoreConfig::load_with(None, |key| env.get(key).map(|v| v.to_string())).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }
}
