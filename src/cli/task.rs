//! Project, task list, and task subcommands.

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// Create a task list, optionally inside a project
    Create {
        title: String,

        /// Owning project id
        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task
    Create {
        /// Task list the task belongs to
        list_id: String,

        title: String,

        /// Explicit id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Exit criterion (repeatable, at least one)
        #[arg(long = "criterion", required = true)]
        criteria: Vec<String>,

        /// Id of a task this one depends on (repeatable)
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
    },

    /// Show a task
    Show { task_id: String },

    /// Replace a task's dependencies (no targets clears them)
    Deps {
        task_id: String,
        targets: Vec<String>,
    },

    /// Add dependencies to a task
    AddDeps {
        task_id: String,

        #[arg(required = true)]
        targets: Vec<String>,
    },

    /// Remove one dependency from a task
    Unlink { task_id: String, target_id: String },

    /// Change a task's status
    Status {
        task_id: String,

        /// NOT_STARTED, IN_PROGRESS, BLOCKED or COMPLETED
        status: String,
    },

    /// Mark an exit criterion complete or incomplete
    Criterion {
        task_id: String,

        /// Zero-based position of the criterion
        index: usize,

        /// COMPLETE or INCOMPLETE
        status: String,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete a task
    Delete { task_id: String },
}
