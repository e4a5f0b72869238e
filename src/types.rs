//! Core types for the task dependency graph.

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Blocked,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "NOT_STARTED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Blocked => "BLOCKED",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    /// Parse a status name. Accepts the canonical form as well as lowercase
    /// and kebab-case spellings (`in_progress`, `in-progress`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "NOT_STARTED" => Some(TaskStatus::NotStarted),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "BLOCKED" => Some(TaskStatus::Blocked),
            "COMPLETED" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single exit criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionStatus {
    #[default]
    Incomplete,
    Complete,
}

impl CriterionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CriterionStatus::Incomplete => "INCOMPLETE",
            CriterionStatus::Complete => "COMPLETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOMPLETE" => Some(CriterionStatus::Incomplete),
            "COMPLETE" => Some(CriterionStatus::Complete),
            _ => None,
        }
    }
}

/// A condition that must hold before a task may be completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitCriterion {
    pub criteria: String,
    #[serde(default)]
    pub status: CriterionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ExitCriterion {
    pub fn new(criteria: impl Into<String>) -> Self {
        Self {
            criteria: criteria.into(),
            status: CriterionStatus::Incomplete,
            comment: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == CriterionStatus::Complete
    }
}

/// A dependency edge. The source is the task that owns the dependency list;
/// this record names the target, which must be COMPLETED first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub task_id: String,
    pub task_list_id: String,
}

impl Dependency {
    pub fn new(task_id: impl Into<String>, task_list_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            task_list_id: task_list_id.into(),
        }
    }
}

/// A project: an aggregate of task lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task list, optionally attached to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task in a task list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub task_list_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub dependencies: Vec<Dependency>,
    pub exit_criteria: Vec<ExitCriterion>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    /// Whether this task satisfies the dependencies of other tasks.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Whether every exit criterion is COMPLETE.
    pub fn exit_criteria_met(&self) -> bool {
        self.exit_criteria.iter().all(ExitCriterion::is_complete)
    }

    /// Ids of the tasks this task depends on, in stored order.
    pub fn dependency_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.task_id.as_str())
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    /// Custom task ID (optional, UUID7 generated if not provided)
    pub id: Option<String>,
    pub task_list_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Exit criteria descriptions. At least one is required.
    pub exit_criteria: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl NewTask {
    pub fn new(task_list_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            task_list_id: task_list_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_criterion(mut self, criteria: impl Into<String>) -> Self {
        self.exit_criteria.push(criteria.into());
        self
    }

    pub fn with_dependency(mut self, dep: Dependency) -> Self {
        self.dependencies.push(dep);
        self
    }
}

/// Kind of scope a graph query runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    Project,
    TaskList,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Project => "project",
            ScopeType::TaskList => "task_list",
        }
    }

    /// Parse a scope type name, failing with a scope error for anything
    /// other than `project` or `task_list`.
    pub fn parse(s: &str) -> Result<Self, GraphError> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "project" => Ok(ScopeType::Project),
            "task_list" | "tasklist" => Ok(ScopeType::TaskList),
            other => Err(GraphError::Scope(format!(
                "unknown scope type '{}': expected 'project' or 'task_list'",
                other
            ))),
        }
    }
}

/// A project or a single task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub scope_type: ScopeType,
    pub scope_id: String,
}

impl Scope {
    pub fn project(id: impl Into<String>) -> Self {
        Self {
            scope_type: ScopeType::Project,
            scope_id: id.into(),
        }
    }

    pub fn task_list(id: impl Into<String>) -> Self {
        Self {
            scope_type: ScopeType::TaskList,
            scope_id: id.into(),
        }
    }

    pub fn parse(scope_type: &str, scope_id: &str) -> Result<Self, GraphError> {
        let scope_type = ScopeType::parse(scope_type)?;
        if scope_id.trim().is_empty() {
            return Err(GraphError::Scope("scope id must not be empty".to_string()));
        }
        Ok(Self {
            scope_type,
            scope_id: scope_id.to_string(),
        })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope_type.as_str(), self.scope_id)
    }
}

/// Why a task cannot start yet. Derived on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockReason {
    pub is_blocked: bool,
    pub blocking_task_ids: Vec<String>,
    pub blocking_task_titles: Vec<String>,
    pub message: String,
}

/// A blocked task together with its reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedTask {
    pub task: Task,
    pub reason: BlockReason,
}

/// Critical path and progress over a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyAnalysisResult {
    pub critical_path: Vec<String>,
    pub critical_path_length: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_progress: f64,
}
