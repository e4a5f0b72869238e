//! Configuration discovery and environment overrides.

use super::types::{Config, StoreBackend};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Explicit config file (overrides discovery).
pub const ENV_CONFIG_PATH: &str = "TASK_DEPS_CONFIG_PATH";
pub const ENV_BACKEND: &str = "TASK_DEPS_BACKEND";
pub const ENV_DB_PATH: &str = "TASK_DEPS_DB_PATH";
pub const ENV_DATA_DIR: &str = "TASK_DEPS_DATA_DIR";
pub const ENV_MULTI_AGENT: &str = "TASK_DEPS_MULTI_AGENT";

/// Where configuration may come from, in lookup order.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project-level config file (`./task-deps/config.yaml`)
    pub project_file: PathBuf,
    /// User-level config file (`~/.task-deps/config.yaml`)
    pub user_file: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    pub fn discover() -> Self {
        Self {
            project_file: PathBuf::from("task-deps").join("config.yaml"),
            user_file: dirs::home_dir().map(|h| h.join(".task-deps").join("config.yaml")),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve configuration: explicit path, then project file, then user
    /// file, then defaults; environment overrides are applied last.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        Self::resolve_with(explicit, &ConfigPaths::discover(), |key| std::env::var(key).ok())
    }

    /// [`Config::resolve`] with injectable paths and environment.
    pub fn resolve_with<F>(
        explicit: Option<&Path>,
        paths: &ConfigPaths,
        env: F,
    ) -> Result<(Self, Option<PathBuf>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| env(ENV_CONFIG_PATH).map(PathBuf::from));

        let (mut config, source) = match explicit {
            // An explicitly named file must load
            Some(path) => (Self::load(&path)?, Some(path)),
            None => {
                let candidates = std::iter::once(paths.project_file.clone())
                    .chain(paths.user_file.clone());
                let mut found = None;
                for path in candidates {
                    if !path.is_file() {
                        continue;
                    }
                    match Self::load(&path) {
                        Ok(config) => {
                            found = Some((config, Some(path)));
                            break;
                        }
                        Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unreadable config file"),
                    }
                }
                found.unwrap_or_else(|| (Self::default(), None))
            }
        };

        config.apply_env(env);
        Ok((config, source))
    }

    /// Apply `TASK_DEPS_*` overrides.
    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = env(ENV_BACKEND) {
            match StoreBackend::parse(&backend) {
                Some(backend) => self.store.backend = backend,
                None => warn!(value = %backend, "Ignoring unknown {}", ENV_BACKEND),
            }
        }

        if let Some(db_path) = env(ENV_DB_PATH) {
            self.store.db_path = PathBuf::from(db_path);
        }

        if let Some(data_dir) = env(ENV_DATA_DIR) {
            self.store.data_dir = PathBuf::from(data_dir);
        }

        if let Some(flag) = env(ENV_MULTI_AGENT) {
            match parse_bool(&flag) {
                Some(value) => self.ready.multi_agent_mode = value,
                None => warn!(value = %flag, "Ignoring non-boolean {}", ENV_MULTI_AGENT),
            }
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
