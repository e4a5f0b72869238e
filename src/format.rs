//! Output formatting utilities for markdown and JSON.

use crate::types::{
    BlockReason, BlockedTask, DependencyAnalysisResult, Project, Task, TaskList,
};
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

/// Pretty JSON for any serializable result.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Format a single task as markdown.
pub fn format_task_markdown(task: &Task) -> String {
    let mut md = String::new();

    md.push_str(&format!("## Task: {}\n", task.title));
    md.push_str(&format!("- **id**: `{}`\n", task.id));
    md.push_str(&format!("- **list**: `{}`\n", task.task_list_id));
    md.push_str(&format!("- **status**: {}\n", task.status));

    if !task.dependencies.is_empty() {
        let deps: Vec<String> = task
            .dependencies
            .iter()
            .map(|d| format!("`{}`", d.task_id))
            .collect();
        md.push_str(&format!("- **depends_on**: {}\n", deps.join(", ")));
    }

    if let Some(ref desc) = task.description {
        md.push_str("\n### Description\n");
        md.push_str(desc);
        md.push('\n');
    }

    md.push_str("\n### Exit criteria\n");
    for (i, criterion) in task.exit_criteria.iter().enumerate() {
        let mark = if criterion.is_complete() { "x" } else { " " };
        md.push_str(&format!("{}. [{}] {}", i, mark, criterion.criteria));
        if let Some(ref comment) = criterion.comment {
            md.push_str(&format!(" - _{}_", comment));
        }
        md.push('\n');
    }

    md
}

/// Format a task in short form for lists.
fn format_task_short(task: &Task) -> String {
    format!("- {} `{}` ({})\n", task.title, short_id(&task.id), task.status)
}

/// Format the ready list.
pub fn format_ready_markdown(tasks: &[Task]) -> String {
    let mut md = format!("# Ready tasks ({})\n\n", tasks.len());
    for task in tasks {
        md.push_str(&format_task_short(task));
    }
    md
}

/// Format a blocked list with the reason for each entry.
pub fn format_blocked_markdown(blocked: &[BlockedTask]) -> String {
    let mut md = format!("# Blocked tasks ({})\n\n", blocked.len());
    for entry in blocked {
        md.push_str(&format!(
            "- {} `{}`: {}\n",
            entry.task.title,
            short_id(&entry.task.id),
            entry.reason.message
        ));
    }
    md
}

/// Format the evaluation of one task. `None` means nothing blocks it.
pub fn format_block_reason_markdown(task: &Task, reason: Option<&BlockReason>) -> String {
    match reason {
        None => format!("**{}** is not blocked.\n", task.title),
        Some(reason) => {
            let mut md = format!("**{}**: {}\n\n", task.title, reason.message);
            for (id, title) in reason
                .blocking_task_ids
                .iter()
                .zip(&reason.blocking_task_titles)
            {
                md.push_str(&format!("- {} `{}`\n", title, id));
            }
            md
        }
    }
}

/// Format a scope analysis.
pub fn format_analysis_markdown(result: &DependencyAnalysisResult) -> String {
    let mut md = String::from("# Dependency analysis\n\n");
    md.push_str(&format!(
        "- **progress**: {}/{} ({:.1}%)\n",
        result.completed_tasks, result.total_tasks, result.completion_progress
    ));
    md.push_str(&format!(
        "- **critical path length**: {}\n",
        result.critical_path_length
    ));

    if !result.critical_path.is_empty() {
        md.push_str("\n## Critical path\n\n");
        for (i, id) in result.critical_path.iter().enumerate() {
            md.push_str(&format!("{}. `{}`\n", i + 1, id));
        }
    }

    md
}

pub fn format_project_markdown(project: &Project) -> String {
    let mut md = format!("## Project: {}\n- **id**: `{}`\n", project.name, project.id);
    if let Some(ref desc) = project.description {
        md.push_str(&format!("\n{}\n", desc));
    }
    md
}

pub fn format_task_list_markdown(list: &TaskList) -> String {
    let mut md = format!("## Task list: {}\n- **id**: `{}`\n", list.title, list.id);
    if let Some(ref project_id) = list.project_id {
        md.push_str(&format!("- **project**: `{}`\n", project_id));
    }
    if let Some(ref desc) = list.description {
        md.push_str(&format!("\n{}\n", desc));
    }
    md
}
