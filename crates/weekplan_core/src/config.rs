//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Locate the planner database and the log directory.
//! - Pick the log level.
//!
//! # Invariants
//! - Blank environment values count as unset.
//! - `log_dir` is absolute whenever it is set, as `init_logging` requires.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "WEEKPLAN_DB_PATH";
pub const LOG_DIR_ENV: &str = "WEEKPLAN_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "WEEKPLAN_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "weekplan.sqlite3";

/// Resolved planner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub db_path: PathBuf,
    /// File logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelativeLogDir(path) => write!(
                f,
                "{LOG_DIR_ENV} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_dir: None,
            log_level: default_log_level().to_string(),
        }
    }
}

impl PlannerConfig {
    /// Reads `WEEKPLAN_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves settings through `lookup`; used by `from_env` and tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(dir) = read(LOG_DIR_ENV) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(dir);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, PlannerConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = PlannerConfig::from_lookup(lookup(&[(DB_PATH_ENV, "  ")])).unwrap();
        assert_eq!(config, PlannerConfig::default());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let log_dir = std::env::temp_dir().join("weekplan-logs");
        let config = PlannerConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, "/data/plan.db"),
            (LOG_DIR_ENV, log_dir.to_str().unwrap()),
            (LOG_LEVEL_ENV, "warn"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/plan.db"));
        assert_eq!(config.log_dir, Some(log_dir));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = PlannerConfig::from_lookup(lookup(&[(LOG_DIR_ENV, "logs")])).unwrap_err();
        assert_eq!(err, ConfigError::RelativeLogDir(PathBuf::from("logs")));
    }
}
