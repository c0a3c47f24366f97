//! Core configuration.
//!
//! # Responsibility
//! - Describe where the core keeps its database, logs and backups.
//! - Validate host-provided paths before anything touches the filesystem.
//!
//! # Invariants
//! - `data_dir` is absolute.
//! - Derived paths are stable for a given `data_dir`.

use crate::logging::default_log_level;
use std::path::{Path, PathBuf};

/// Database file name inside `data_dir`.
pub const DB_FILE_NAME: &str = "keepfoss.sqlite3";
const LOG_DIR_NAME: &str = "logs";
const BACKUP_DIR_NAME: &str = "backups";

/// Host-supplied settings for one core instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    data_dir: PathBuf,
    log_level: String,
}

impl CoreConfig {
    /// Creates a config rooted at `data_dir` with the build-default log level.
    ///
    /// # Errors
    /// - Returns an error when `data_dir` is empty or relative.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, String> {
        let data_dir = data_dir.as_ref();
        if data_dir.as_os_str().is_empty() {
            return Err("data_dir cannot be empty".to_string());
        }
        if !data_dir.is_absolute() {
            return Err(format!(
                "data_dir must be an absolute path, got `{}`",
                data_dir.display()
            ));
        }

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            log_level: default_log_level().to_string(),
        })
    }

    /// Overrides the log level (`trace|debug|info|warn|error`).
    ///
    /// The value is validated when logging starts.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }

    /// Default destination for exported backups.
    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUP_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::CoreConfig;

    #[test]
    fn rejects_relative_data_dir() {
        let err = CoreConfig::new("notes/data").unwrap_err();
        assert!(err.contains("absolute"));
    }

    #[test]
    fn derives_paths_under_data_dir() {
        let root = std::env::temp_dir().join("keepfoss-config");
        let config = CoreConfig::new(&root).unwrap().with_log_level("warn");
        assert_eq!(config.db_path(), root.join("keepfoss.sqlite3"));
        assert_eq!(config.log_dir(), root.join("logs"));
        assert_eq!(config.backup_dir(), root.join("backups"));
        assert_eq!(config.log_level(), "warn");
    }
}
