//! Storage contract consumed by the graph engine.
//!
//! The engine only reads through [`TaskStore`]. Writes go through
//! [`TaskWriter`], which the validated write path in [`crate::graph::TaskGraph`]
//! uses after a dependency set has passed validation. Two adapters implement
//! both traits: [`crate::db::Database`] (SQLite) and [`FileStore`] (one JSON
//! document per entity).

pub mod file;

pub use file::FileStore;

use crate::types::{CriterionStatus, Dependency, NewTask, Project, Task, TaskList, TaskStatus};
use anyhow::Result;

/// Read side of the backing store.
pub trait TaskStore {
    /// Fetch a single task, or `None` if it does not exist.
    fn get_task(&self, id: &str) -> Result<Option<Task>>;

    /// List tasks in insertion order, optionally restricted to one task list.
    fn list_tasks(&self, task_list_id: Option<&str>) -> Result<Vec<Task>>;

    /// List task lists in insertion order, optionally restricted to one project.
    fn list_task_lists(&self, project_id: Option<&str>) -> Result<Vec<TaskList>>;

    fn get_task_list(&self, id: &str) -> Result<Option<TaskList>>;

    fn get_project(&self, id: &str) -> Result<Option<Project>>;
}

/// Write side of the backing store.
///
/// Adapters enforce entity invariants here: a task needs at least one exit
/// criterion, and may only become COMPLETED once every criterion is COMPLETE.
/// Adapters do not check dependency acyclicity; that is the caller's job.
pub trait TaskWriter: TaskStore {
    fn create_project(&self, name: &str, description: Option<&str>) -> Result<Project>;

    fn create_task_list(
        &self,
        project_id: Option<&str>,
        title: &str,
        description: Option<&str>,
    ) -> Result<TaskList>;

    /// Persist a new task. `input.id` must already be assigned.
    fn create_task(&self, input: &NewTask) -> Result<Task>;

    /// Replace a task's dependency set. Duplicate targets are collapsed.
    fn set_dependencies(&self, task_id: &str, dependencies: &[Dependency]) -> Result<Task>;

    fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<Task>;

    fn set_criterion_status(
        &self,
        task_id: &str,
        index: usize,
        status: CriterionStatus,
        comment: Option<&str>,
    ) -> Result<Task>;

    /// Delete a task. Returns false if it did not exist. Dependencies that
    /// point at the deleted task are left in place.
    fn delete_task(&self, task_id: &str) -> Result<bool>;
}

/// Generate a new entity id.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Drop repeated targets, keeping the first occurrence.
pub(crate) fn dedupe_dependencies(dependencies: &[Dependency]) -> Vec<Dependency> {
    let mut seen = std::collections::HashSet::new();
    dependencies
        .iter()
        .filter(|d| seen.insert(d.task_id.as_str()))
        .cloned()
        .collect()
}

/// Shared checks for new tasks.
pub(crate) fn check_new_task(input: &NewTask) -> Result<()> {
    if input.title.trim().is_empty() {
        anyhow::bail!("task title must not be empty");
    }
    if input.exit_criteria.is_empty() {
        anyhow::bail!("task requires at least one exit criterion");
    }
    if input.exit_criteria.iter().any(|c| c.trim().is_empty()) {
        anyhow::bail!("exit criteria must not be empty");
    }
    Ok(())
}

/// Shared check for status transitions.
pub(crate) fn check_status_transition(task: &Task, status: TaskStatus) -> Result<()> {
    if status == TaskStatus::Completed && !task.exit_criteria_met() {
        let open: Vec<&str> = task
            .exit_criteria
            .iter()
            .filter(|c| !c.is_complete())
            .map(|c| c.criteria.as_str())
            .collect();
        anyhow::bail!(
            "cannot complete task {}: incomplete exit criteria: {}",
            task.id,
            open.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let deps = vec![
            Dependency::new("a", "l1"),
            Dependency::new("b", "l1"),
            Dependency::new("a", "l2"),
        ];
        let deduped = dedupe_dependencies(&deps);
        assert_eq!(deduped, vec![Dependency::new("a", "l1"), Dependency::new("b", "l1")]);
    }

    #[test]
    fn new_task_requires_exit_criterion() {
        let input = NewTask::new("l1", "Write docs");
        assert!(check_new_task(&input).is_err());
        assert!(check_new_task(&input.with_criterion("Docs merged")).is_ok());
    }
}
