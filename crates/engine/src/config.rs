//! Engine configuration via `ember.toml`
//!
//! A plain config file read at startup. To change settings, edit the file
//! and restart the engine.

use std::path::{Path, PathBuf};

use ember_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "ember.toml";

/// When the append-only log is fsynced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsyncPolicy {
    /// fsync after every propagated batch
    Always,
    /// Leave flushing to the operating system
    No,
}

/// Engine configuration loaded from `ember.toml`.
///
/// # Example
///
/// ```toml
/// databases = 16
/// # appendonly = "appendonly.aof"
/// appendfsync = "no"
/// backlog_capacity = 1024
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Number of logical databases.
    #[serde(default = "default_databases")]
    pub databases: usize,
    /// Path of the append-only propagation log. Disabled when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appendonly: Option<PathBuf>,
    /// `"always"` or `"no"`.
    #[serde(default = "default_appendfsync")]
    pub appendfsync: String,
    /// Maximum number of entries kept in the in-memory replication backlog.
    #[serde(default = "default_backlog_capacity")]
    pub backlog_capacity: usize,
}

fn default_databases() -> usize {
    16
}

fn default_appendfsync() -> String {
    "no".to_string()
}

fn default_backlog_capacity() -> usize {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            databases: default_databases(),
            appendonly: None,
            appendfsync: default_appendfsync(),
            backlog_capacity: default_backlog_capacity(),
        }
    }
}

impl EngineConfig {
    /// Parse `appendfsync`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"always"` or `"no"`.
    pub fn fsync_policy(&self) -> Result<FsyncPolicy> {
        match self.appendfsync.as_str() {
            "always" => Ok(FsyncPolicy::Always),
            "no" => Ok(FsyncPolicy::No),
            other => Err(Error::Config(format!(
                "Invalid appendfsync '{}' in {}. Expected \"always\" or \"no\".",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Check every field.
    pub fn validate(&self) -> Result<()> {
        if self.databases == 0 {
            return Err(Error::Config("databases must be at least 1".to_string()));
        }
        if self.backlog_capacity == 0 {
            return Err(Error::Config("backlog_capacity must be at least 1".to_string()));
        }
        self.fsync_policy()?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Ember engine configuration
#
# Number of logical databases, selected with SELECT (default: 16)
databases = 16

# Append-only propagation log. Every replicated command is appended here.
# appendonly = "appendonly.aof"

# When to fsync the append-only log: "always" or "no" (default: "no")
#   "always" = fsync after every command, zero data loss
#   "no"     = let the OS flush
appendfsync = "no"

# Entries kept in the in-memory replication backlog (default: 1024)
backlog_capacity = 1024
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: EngineConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        debug!(target: "ember::config", path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
