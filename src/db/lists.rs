//! Project and task list operations.

use super::Database;
use crate::store::{new_id, now_ms};
use crate::types::{Project, TaskList};
use anyhow::{anyhow, Result};
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_task_list_row(row: &Row) -> rusqlite::Result<TaskList> {
    Ok(TaskList {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Database {
    /// Create a new project.
    pub fn create_project(&self, name: &str, description: Option<&str>) -> Result<Project> {
        if name.trim().is_empty() {
            return Err(anyhow!("project name must not be empty"));
        }
        let now = now_ms();
        let project = Project {
            id: new_id(),
            name: name.to_string(),
            description: description.map(String::from),
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (id, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &project.id,
                    &project.name,
                    &project.description,
                    project.created_at,
                    project.updated_at
                ],
            )?;
            Ok(())
        })?;

        info!(project_id = %project.id, name = %project.name, "Created project");
        Ok(project)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        self.with_conn(|conn| {
            let project = conn
                .query_row(
                    "SELECT * FROM projects WHERE id = ?1",
                    params![id],
                    parse_project_row,
                )
                .optional()?;
            Ok(project)
        })
    }

    /// Create a new task list, optionally inside a project.
    pub fn create_task_list(
        &self,
        project_id: Option<&str>,
        title: &str,
        description: Option<&str>,
    ) -> Result<TaskList> {
        if title.trim().is_empty() {
            return Err(anyhow!("task list title must not be empty"));
        }
        if let Some(pid) = project_id {
            if self.get_project(pid)?.is_none() {
                return Err(anyhow!("Project not found: {}", pid));
            }
        }

        let now = now_ms();
        let list = TaskList {
            id: new_id(),
            project_id: project_id.map(String::from),
            title: title.to_string(),
            description: description.map(String::from),
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO task_lists (id, project_id, title, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &list.id,
                    &list.project_id,
                    &list.title,
                    &list.description,
                    list.created_at,
                    list.updated_at
                ],
            )?;
            Ok(())
        })?;

        info!(task_list_id = %list.id, title = %list.title, "Created task list");
        Ok(list)
    }

    pub fn get_task_list(&self, id: &str) -> Result<Option<TaskList>> {
        self.with_conn(|conn| {
            let list = conn
                .query_row(
                    "SELECT * FROM task_lists WHERE id = ?1",
                    params![id],
                    parse_task_list_row,
                )
                .optional()?;
            Ok(list)
        })
    }

    /// List task lists in creation order, optionally for one project.
    pub fn list_task_lists(&self, project_id: Option<&str>) -> Result<Vec<TaskList>> {
        self.with_conn(|conn| {
            let lists = match project_id {
                Some(pid) => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM task_lists WHERE project_id = ?1 ORDER BY rowid",
                    )?;
                    stmt.query_map(params![pid], parse_task_list_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?
                }
                None => {
                    let mut stmt = conn.prepare("SELECT * FROM task_lists ORDER BY rowid")?;
                    stmt.query_map([], parse_task_list_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?
                }
            };
            Ok(lists)
        })
    }
}
