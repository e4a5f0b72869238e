//! CLI command definitions for task-deps
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod task;

use crate::config::StoreBackend;
use crate::format::OutputFormat;
use crate::graph::GraphFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use task::{ListCommand, ProjectCommand, TaskCommand};

/// Storage backend selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Sqlite,
    File,
}

impl From<BackendArg> for StoreBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sqlite => StoreBackend::Sqlite,
            BackendArg::File => StoreBackend::File,
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Json,
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

/// Graph rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StyleArg {
    #[default]
    Mermaid,
    Dot,
}

impl From<StyleArg> for GraphFormat {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Mermaid => GraphFormat::Mermaid,
            StyleArg::Dot => GraphFormat::Dot,
        }
    }
}

/// Dependency tracking for task lists and projects
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Root directory of the file store (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Storage backend (overrides config)
    #[arg(long, value_enum, global = true)]
    pub backend: Option<BackendArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Json, global = true)]
    pub format: FormatArg,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr, or filename (overrides config)
    #[arg(short, long, global = true)]
    pub log: Option<String>,

    /// Only offer NOT_STARTED tasks as ready
    #[arg(long, global = true)]
    pub multi_agent: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// A scope given as `<scope-type> <scope-id>`.
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Scope type: project or task_list
    pub scope_type: String,

    /// Id of the project or task list
    pub scope_id: String,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage task lists
    #[command(subcommand)]
    List(ListCommand),

    /// Manage tasks and their dependencies
    #[command(subcommand)]
    Task(TaskCommand),

    /// Explain whether a single task is blocked
    Blocked {
        task_id: String,
    },

    /// List blocked tasks in a scope with their reasons
    BlockedIn(ScopeArgs),

    /// List tasks that can be started now
    Ready(ScopeArgs),

    /// Critical path and completion progress of a scope
    Analyze(ScopeArgs),

    /// Render a scope's dependency graph
    Graph {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Rendering style
        #[arg(long, value_enum, default_value_t = StyleArg::Mermaid)]
        style: StyleArg,
    },
}
