//! Task CRUD operations.

use super::deps::{insert_dependencies, load_dependencies};
use super::Database;
use crate::store::{check_new_task, check_status_transition, dedupe_dependencies, now_ms};
use crate::types::{CriterionStatus, ExitCriterion, NewTask, Task, TaskStatus};
use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

/// Task row without its child collections.
fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    Ok(Task {
        id: row.get("id")?,
        task_list_id: row.get("task_list_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        // Unknown values only appear if the table was edited by hand
        status: TaskStatus::parse(&status).unwrap_or_default(),
        dependencies: Vec::new(),
        exit_criteria: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_exit_criteria(conn: &Connection, task_id: &str) -> Result<Vec<ExitCriterion>> {
    let mut stmt = conn.prepare(
        "SELECT criteria, status, comment FROM exit_criteria
         WHERE task_id = ?1 ORDER BY position",
    )?;
    let criteria = stmt
        .query_map(params![task_id], |row| {
            let criteria: String = row.get(0)?;
            let status: String = row.get(1)?;
            let comment: Option<String> = row.get(2)?;
            Ok(ExitCriterion {
                criteria,
                status: CriterionStatus::parse(&status).unwrap_or_default(),
                comment,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(criteria)
}

/// Fill in dependencies and exit criteria for a bare task row.
fn hydrate(conn: &Connection, mut task: Task) -> Result<Task> {
    task.dependencies = load_dependencies(conn, &task.id)?;
    task.exit_criteria = load_exit_criteria(conn, &task.id)?;
    Ok(task)
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(super) fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let row = conn
        .query_row(
            "SELECT * FROM tasks WHERE id = ?1",
            params![task_id],
            parse_task_row,
        )
        .optional()?;

    match row {
        Some(task) => Ok(Some(hydrate(conn, task)?)),
        None => Ok(None),
    }
}

fn require_task(conn: &Connection, task_id: &str) -> Result<Task> {
    get_task_internal(conn, task_id)?.ok_or_else(|| anyhow!("Task not found: {}", task_id))
}

impl Database {
    /// Create a new task with its exit criteria and dependencies.
    ///
    /// Dependencies are stored as given; cycle checks belong to the caller.
    pub fn create_task(&self, input: &NewTask) -> Result<Task> {
        check_new_task(input)?;
        let id = input
            .id
            .clone()
            .ok_or_else(|| anyhow!("task id must be assigned before persisting"))?;
        let now = now_ms();
        let dependencies = dedupe_dependencies(&input.dependencies);

        let task = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let list_exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM task_lists WHERE id = ?1)",
                params![&input.task_list_id],
                |row| row.get(0),
            )?;
            if !list_exists {
                return Err(anyhow!("Task list not found: {}", input.task_list_id));
            }

            tx.execute(
                "INSERT INTO tasks (id, task_list_id, title, description, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    &id,
                    &input.task_list_id,
                    &input.title,
                    &input.description,
                    TaskStatus::NotStarted.as_str(),
                    now
                ],
            )?;

            for (position, criteria) in input.exit_criteria.iter().enumerate() {
                tx.execute(
                    "INSERT INTO exit_criteria (task_id, position, criteria, status)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        &id,
                        position as i64,
                        criteria,
                        CriterionStatus::Incomplete.as_str()
                    ],
                )?;
            }

            insert_dependencies(&tx, &id, &dependencies)?;

            let task = require_task(&tx, &id)?;
            tx.commit()?;
            Ok(task)
        })?;

        info!(task_id = %task.id, task_list_id = %task.task_list_id, "Created task");
        Ok(task)
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// List tasks in insertion order, optionally for one task list.
    pub fn list_tasks(&self, task_list_id: Option<&str>) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let rows = match task_list_id {
                Some(lid) => {
                    let mut stmt =
                        conn.prepare("SELECT * FROM tasks WHERE task_list_id = ?1 ORDER BY rowid")?;
                    stmt.query_map(params![lid], parse_task_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?
                }
                None => {
                    let mut stmt = conn.prepare("SELECT * FROM tasks ORDER BY rowid")?;
                    stmt.query_map([], parse_task_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?
                }
            };

            rows.into_iter().map(|task| hydrate(conn, task)).collect()
        })
    }

    /// Change a task's status. Completing requires every exit criterion to be COMPLETE.
    pub fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<Task> {
        let task = self.with_conn(|conn| {
            let task = require_task(conn, task_id)?;
            check_status_transition(&task, status)?;

            conn.execute(
                "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now_ms(), task_id],
            )?;
            require_task(conn, task_id)
        })?;

        info!(task_id = %task_id, status = %status, "Updated task status");
        Ok(task)
    }

    /// Mark one exit criterion (by position) complete or incomplete.
    pub fn set_criterion_status(
        &self,
        task_id: &str,
        index: usize,
        status: CriterionStatus,
        comment: Option<&str>,
    ) -> Result<Task> {
        self.with_conn(|conn| {
            let task = require_task(conn, task_id)?;
            if index >= task.exit_criteria.len() {
                return Err(anyhow!(
                    "Exit criterion {} out of range: task {} has {}",
                    index,
                    task_id,
                    task.exit_criteria.len()
                ));
            }

            conn.execute(
                "UPDATE exit_criteria SET status = ?1, comment = COALESCE(?2, comment)
                 WHERE task_id = ?3 AND position = ?4",
                params![status.as_str(), comment, task_id, index as i64],
            )?;
            conn.execute(
                "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
                params![now_ms(), task_id],
            )?;
            require_task(conn, task_id)
        })
    }

    /// Delete a task. Edges pointing at it from other tasks are kept.
    pub fn delete_task(&self, task_id: &str) -> Result<bool> {
        let deleted = self.with_conn(|conn| {
            let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(rows > 0)
        })?;
        if deleted {
            info!(task_id = %task_id, "Deleted task");
        }
        Ok(deleted)
    }
}
