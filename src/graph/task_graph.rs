//! Validated write path and read paths over a task store.

use super::analyzer::GraphAnalyzer;
use super::blocking::BlockingEvaluator;
use super::reader::GraphReader;
use super::render::{render, GraphFormat};
use super::validator::DependencyValidator;
use crate::error::{GraphError, Result};
use crate::store::{new_id, TaskWriter};
use crate::types::{
    BlockReason, BlockedTask, CriterionStatus, Dependency, DependencyAnalysisResult, NewTask,
    Project, Task, TaskList, TaskStatus,
};
use anyhow::anyhow;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// Entry point for clients: every dependency write is validated and then
/// persisted while holding the write lock, so two writers sharing one
/// `TaskGraph` cannot jointly close a cycle. Writers in other processes are
/// not covered.
pub struct TaskGraph<S: TaskWriter> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: TaskWriter> TaskGraph<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reader(&self) -> GraphReader<'_, S> {
        GraphReader::new(&self.store)
    }

    pub fn validator(&self) -> DependencyValidator<'_, S> {
        DependencyValidator::new(&self.store)
    }

    pub fn evaluator(&self) -> BlockingEvaluator<'_, S> {
        BlockingEvaluator::new(&self.store)
    }

    pub fn analyzer(&self) -> GraphAnalyzer<'_, S> {
        GraphAnalyzer::new(&self.store)
    }

    fn write_guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| GraphError::Store(anyhow!("task graph write lock poisoned")))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub fn create_project(&self, name: &str, description: Option<&str>) -> Result<Project> {
        Ok(self.store.create_project(name, description)?)
    }

    pub fn create_task_list(
        &self,
        project_id: Option<&str>,
        title: &str,
        description: Option<&str>,
    ) -> Result<TaskList> {
        Ok(self.store.create_task_list(project_id, title, description)?)
    }

    /// Create a task, validating its initial dependencies first.
    pub fn create_task(&self, mut input: NewTask) -> Result<Task> {
        let id = input.id.get_or_insert_with(new_id).clone();

        let _guard = self.write_guard()?;
        self.validator()
            .validate(&id, &input.task_list_id, &input.dependencies)?;
        Ok(self.store.create_task(&input)?)
    }

    /// Add dependencies on `target_ids` to the task's existing set.
    pub fn add_dependencies(&self, task_id: &str, target_ids: &[String]) -> Result<Task> {
        let _guard = self.write_guard()?;
        let task = self.get_task(task_id)?;

        // Only the new targets must exist; edges already stored may point at
        // deleted tasks and keep blocking until removed.
        let mut dependencies = task.dependencies.clone();
        for dep in self.resolve_targets(target_ids)? {
            if !dependencies.iter().any(|d| d.task_id == dep.task_id) {
                dependencies.push(dep);
            }
        }

        self.validator()
            .ensure_acyclic(&task.id, &task.task_list_id, &dependencies)?;
        Ok(self.store.set_dependencies(&task.id, &dependencies)?)
    }

    /// Replace the task's dependency set with `target_ids`.
    pub fn set_dependencies(&self, task_id: &str, target_ids: &[String]) -> Result<Task> {
        let _guard = self.write_guard()?;
        let task = self.get_task(task_id)?;
        let dependencies = self.resolve_targets(target_ids)?;
        self.persist_dependencies(&task, dependencies)
    }

    /// Drop one dependency. Removing an edge cannot close a cycle, so no
    /// validation runs.
    pub fn remove_dependency(&self, task_id: &str, target_id: &str) -> Result<Task> {
        let _guard = self.write_guard()?;
        let task = self.get_task(task_id)?;

        if !task.dependency_ids().any(|id| id == target_id) {
            return Err(GraphError::Validation(format!(
                "task {} does not depend on {}",
                task_id, target_id
            )));
        }
        let remaining: Vec<Dependency> = task
            .dependencies
            .iter()
            .filter(|d| d.task_id != target_id)
            .cloned()
            .collect();

        let updated = self.store.set_dependencies(task_id, &remaining)?;
        info!(task_id = %task_id, target = %target_id, "Removed dependency");
        Ok(updated)
    }

    pub fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<Task> {
        self.get_task(task_id)?;
        Ok(self.store.update_status(task_id, status)?)
    }

    pub fn set_criterion_status(
        &self,
        task_id: &str,
        index: usize,
        status: CriterionStatus,
        comment: Option<&str>,
    ) -> Result<Task> {
        self.get_task(task_id)?;
        Ok(self
            .store
            .set_criterion_status(task_id, index, status, comment)?)
    }

    pub fn delete_task(&self, task_id: &str) -> Result<bool> {
        Ok(self.store.delete_task(task_id)?)
    }

    /// Turn target ids into dependency records, failing on the first missing one.
    fn resolve_targets(&self, target_ids: &[String]) -> Result<Vec<Dependency>> {
        target_ids
            .iter()
            .map(|id| match self.store.get_task(id)? {
                Some(target) => Ok(Dependency::new(target.id, target.task_list_id)),
                None => Err(GraphError::MissingTarget(id.clone())),
            })
            .collect()
    }

    /// Validate then store. Caller holds the write lock.
    fn persist_dependencies(&self, task: &Task, dependencies: Vec<Dependency>) -> Result<Task> {
        self.validator()
            .validate(&task.id, &task.task_list_id, &dependencies)?;
        Ok(self.store.set_dependencies(&task.id, &dependencies)?)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get_task(&self, task_id: &str) -> Result<Task> {
        self.store
            .get_task(task_id)?
            .ok_or_else(|| GraphError::TaskNotFound(task_id.to_string()))
    }

    pub fn evaluate_task(&self, task_id: &str) -> Result<Option<BlockReason>> {
        let task = self.get_task(task_id)?;
        self.evaluator().evaluate_task(&task)
    }

    pub fn ready_tasks(
        &self,
        scope_type: &str,
        scope_id: &str,
        multi_agent_mode: bool,
    ) -> Result<Vec<Task>> {
        self.evaluator()
            .ready_tasks(scope_type, scope_id, multi_agent_mode)
    }

    pub fn blocked_tasks(&self, scope_type: &str, scope_id: &str) -> Result<Vec<BlockedTask>> {
        self.evaluator().blocked_tasks(scope_type, scope_id)
    }

    pub fn analyze(&self, scope_type: &str, scope_id: &str) -> Result<DependencyAnalysisResult> {
        self.analyzer().analyze(scope_type, scope_id)
    }

    pub fn render(&self, scope_type: &str, scope_id: &str, format: GraphFormat) -> Result<String> {
        let snapshot = self.reader().load_scope(scope_type, scope_id)?;
        Ok(render(&snapshot, format))
    }
}
