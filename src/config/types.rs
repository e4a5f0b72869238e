//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub ready: ReadyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which backing store to use and where it lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Root directory of the file-backed store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            db_path: default_db_path(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-deps/tasks.db")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("task-deps/data")
}

/// Backing store implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// SQLite database (default)
    #[default]
    Sqlite,
    /// One JSON file per entity
    File,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" | "db" => Some(StoreBackend::Sqlite),
            "file" | "json" => Some(StoreBackend::File),
            _ => None,
        }
    }
}

/// Ready-task policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadyConfig {
    /// Only offer NOT_STARTED tasks, so concurrent agents never pick up a
    /// task another agent already started.
    #[serde(default)]
    pub multi_agent_mode: bool,
}

/// Logging defaults, overridable from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output: 0/off, 1/stdout, 2/stderr, or a file path.
    #[serde(default = "default_log_target")]
    pub target: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            target: default_log_target(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_target() -> String {
    "2".to_string()
}
