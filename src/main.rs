//! task-deps command line
//!
//! Validated dependency edits and blocking, readiness, and critical path
//! queries over a SQLite or file-backed task store.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;
use task_deps::cli::task::{ListCommand, ProjectCommand, TaskCommand};
use task_deps::cli::{Cli, Command};
use task_deps::config::{Config, StoreBackend};
use task_deps::db::Database;
use task_deps::error::{ErrorResponse, GraphError};
use task_deps::format::{self, OutputFormat};
use task_deps::graph::TaskGraph;
use task_deps::logging::{self, LogTarget};
use task_deps::store::{FileStore, TaskWriter};
use task_deps::types::{CriterionStatus, Dependency, NewTask, TaskStatus};
use tracing::{debug, error, info};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<GraphError>() {
                Some(e) if e.is_caller_error() => debug!(error = %e, "Request rejected"),
                _ => error!(error = %err, "Command failed"),
            }
            let response = ErrorResponse::from(err);
            let body =
                serde_json::to_string_pretty(&response).unwrap_or_else(|_| response.to_string());
            eprintln!("{}", body);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let (mut config, config_path) = Config::resolve(cli.config.as_deref().map(Path::new))?;

    // Command line overrides
    if let Some(backend) = cli.backend {
        config.store.backend = backend.into();
    }
    if let Some(db_path) = &cli.database {
        config.store.db_path = db_path.into();
    }
    if let Some(data_dir) = &cli.data_dir {
        config.store.data_dir = data_dir.into();
    }
    if cli.multi_agent {
        config.ready.multi_agent_mode = true;
    }
    if let Some(log) = &cli.log {
        config.logging.target = log.clone();
    }

    logging::init(
        &LogTarget::parse(&config.logging.target),
        &config.logging.level,
        cli.verbose,
    )?;
    debug!(config = ?config_path, backend = ?config.store.backend, "Configuration resolved");

    let format: OutputFormat = cli.format.into();
    let output = match config.store.backend {
        StoreBackend::Sqlite => {
            info!("Database: {:?}", config.store.db_path);
            let graph = TaskGraph::new(Database::open(&config.store.db_path)?);
            execute(&graph, cli.command, format, config.ready.multi_agent_mode)?
        }
        StoreBackend::File => {
            let store = FileStore::open(&config.store.data_dir)?;
            info!("Data dir: {:?}", store.root());
            let graph = TaskGraph::new(store);
            execute(&graph, cli.command, format, config.ready.multi_agent_mode)?
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}

/// Serialize `value` as JSON, or hand it to the markdown formatter.
fn emit<T, F>(value: &T, format: OutputFormat, markdown: F) -> Result<String>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Json => format::to_json(value),
        OutputFormat::Markdown => Ok(markdown(value)),
    }
}

fn parse_task_status(s: &str) -> Result<TaskStatus, GraphError> {
    TaskStatus::parse(s).ok_or_else(|| GraphError::Validation(format!("unknown task status: {}", s)))
}

fn parse_criterion_status(s: &str) -> Result<CriterionStatus, GraphError> {
    CriterionStatus::parse(s)
        .ok_or_else(|| GraphError::Validation(format!("unknown criterion status: {}", s)))
}

fn execute<S: TaskWriter>(
    graph: &TaskGraph<S>,
    command: Command,
    format: OutputFormat,
    multi_agent_mode: bool,
) -> Result<String> {
    let output = match command {
        Command::Project(ProjectCommand::Create { name, description }) => {
            let project = graph.create_project(&name, description.as_deref())?;
            emit(&project, format, format::format_project_markdown)?
        }

        Command::List(ListCommand::Create {
            title,
            project,
            description,
        }) => {
            let list =
                graph.create_task_list(project.as_deref(), &title, description.as_deref())?;
            emit(&list, format, format::format_task_list_markdown)?
        }

        Command::Task(command) => execute_task(graph, command, format)?,

        Command::Blocked { task_id } => {
            let task = graph.get_task(&task_id)?;
            let reason = graph.evaluate_task(&task_id)?;
            match format {
                OutputFormat::Json => format::to_json(&json!({
                    "task_id": task.id,
                    "block_reason": reason,
                }))?,
                OutputFormat::Markdown => {
                    format::format_block_reason_markdown(&task, reason.as_ref())
                }
            }
        }

        Command::BlockedIn(scope) => {
            let blocked = graph.blocked_tasks(&scope.scope_type, &scope.scope_id)?;
            emit(blocked.as_slice(), format, format::format_blocked_markdown)?
        }

        Command::Ready(scope) => {
            let ready = graph.ready_tasks(&scope.scope_type, &scope.scope_id, multi_agent_mode)?;
            emit(ready.as_slice(), format, format::format_ready_markdown)?
        }

        Command::Analyze(scope) => {
            let result = graph.analyze(&scope.scope_type, &scope.scope_id)?;
            emit(&result, format, format::format_analysis_markdown)?
        }

        Command::Graph { scope, style } => {
            graph.render(&scope.scope_type, &scope.scope_id, style.into())?
        }
    };
    Ok(output)
}

fn execute_task<S: TaskWriter>(
    graph: &TaskGraph<S>,
    command: TaskCommand,
    format: OutputFormat,
) -> Result<String> {
    let task = match command {
        TaskCommand::Create {
            list_id,
            title,
            id,
            description,
            criteria,
            depends_on,
        } => {
            let mut input = NewTask::new(list_id, title);
            input.id = id;
            input.description = description;
            input.exit_criteria = criteria;
            for target_id in &depends_on {
                let target = graph
                    .store()
                    .get_task(target_id)?
                    .ok_or_else(|| GraphError::MissingTarget(target_id.clone()))?;
                input.dependencies.push(Dependency::new(target.id, target.task_list_id));
            }
            graph.create_task(input)?
        }
        TaskCommand::Show { task_id } => graph.get_task(&task_id)?,
        TaskCommand::Deps { task_id, targets } => graph.set_dependencies(&task_id, &targets)?,
        TaskCommand::AddDeps { task_id, targets } => graph.add_dependencies(&task_id, &targets)?,
        TaskCommand::Unlink { task_id, target_id } => {
            graph.remove_dependency(&task_id, &target_id)?
        }
        TaskCommand::Status { task_id, status } => {
            graph.update_status(&task_id, parse_task_status(&status)?)?
        }
        TaskCommand::Criterion {
            task_id,
            index,
            status,
            comment,
        } => graph.set_criterion_status(
            &task_id,
            index,
            parse_criterion_status(&status)?,
            comment.as_deref(),
        )?,
        TaskCommand::Delete { task_id } => {
            if !graph.delete_task(&task_id)? {
                return Err(GraphError::TaskNotFound(task_id).into());
            }
            return match format {
                OutputFormat::Json => format::to_json(&json!({ "deleted": task_id })),
                OutputFormat::Markdown => Ok(format!("Deleted task `{}`\n", task_id)),
            };
        }
    };

    emit(&task, format, format::format_task_markdown)
}
