//! Configuration system.
//!
//! Resolution order (later wins):
//! 1. **Defaults** - compiled in
//! 2. **File** - `--config` / `TASK_DEPS_CONFIG_PATH`, else the first of
//!    `./task-deps/config.yaml` and `~/.task-deps/config.yaml` that exists
//! 3. **Environment** - `TASK_DEPS_BACKEND`, `TASK_DEPS_DB_PATH`,
//!    `TASK_DEPS_DATA_DIR`, `TASK_DEPS_MULTI_AGENT`
//! 4. **Command line** - applied by the binary

mod loader;
mod types;

pub use loader::{
    ConfigPaths, ENV_BACKEND, ENV_CONFIG_PATH, ENV_DATA_DIR, ENV_DB_PATH, ENV_MULTI_AGENT,
};
pub use types::*;
