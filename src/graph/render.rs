//! Text renderings of a scope's dependency graph.

use super::reader::ScopeSnapshot;
use crate::types::{Task, TaskStatus};
use std::collections::HashMap;
use std::fmt::Write;

/// Output style for graph rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphFormat {
    #[default]
    Mermaid,
    Dot,
}

/// Render the scope graph. Edges point from a dependency to its dependent;
/// out-of-scope targets are drawn as external nodes.
pub fn render(snapshot: &ScopeSnapshot, format: GraphFormat) -> String {
    match format {
        GraphFormat::Mermaid => render_mermaid(snapshot),
        GraphFormat::Dot => render_dot(snapshot),
    }
}

fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::NotStarted => "[ ]",
        TaskStatus::InProgress => "[~]",
        TaskStatus::Blocked => "[!]",
        TaskStatus::Completed => "[x]",
    }
}

/// Member tasks first, then external targets in first-seen order.
fn node_order(snapshot: &ScopeSnapshot) -> Vec<&Task> {
    let mut nodes: Vec<&Task> = snapshot.tasks().collect();
    for id in snapshot.task_ids() {
        for target in snapshot.dependencies_of(id) {
            if snapshot.is_external(target) && !nodes.iter().any(|t| &t.id == target) {
                if let Some(task) = snapshot.lookup(target) {
                    nodes.push(task);
                }
            }
        }
    }
    nodes
}

fn render_mermaid(snapshot: &ScopeSnapshot) -> String {
    let nodes = node_order(snapshot);
    // Mermaid node ids must be simple identifiers
    let alias: HashMap<&str, String> = nodes
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), format!("n{}", i)))
        .collect();

    let mut out = String::from("graph TD\n");
    for task in &nodes {
        let label = format!(
            "{} {}",
            status_marker(task.status),
            task.title.replace('"', "#quot;")
        );
        let name = &alias[task.id.as_str()];
        if snapshot.is_external(&task.id) {
            let _ = writeln!(out, "    {}([\"{}\"])", name, label);
        } else {
            let _ = writeln!(out, "    {}[\"{}\"]", name, label);
        }
    }
    for id in snapshot.task_ids() {
        for target in snapshot.dependencies_of(id) {
            let arrow = if snapshot.is_external(target) { "-.->" } else { "-->" };
            let _ = writeln!(out, "    {} {} {}", alias[target.as_str()], arrow, alias[id]);
        }
    }
    out
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn render_dot(snapshot: &ScopeSnapshot) -> String {
    let mut out = String::from("digraph tasks {\n    rankdir=LR;\n");
    for task in node_order(snapshot) {
        let style = if snapshot.is_external(&task.id) {
            ", style=dashed"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "    \"{}\" [label=\"{}\\n{}\"{}];",
            dot_escape(&task.id),
            dot_escape(&task.title),
            task.status,
            style
        );
    }
    for id in snapshot.task_ids() {
        for target in snapshot.dependencies_of(id) {
            let _ = writeln!(out, "    \"{}\" -> \"{}\";", dot_escape(target), dot_escape(id));
        }
    }
    out.push_str("}\n");
    out
}
