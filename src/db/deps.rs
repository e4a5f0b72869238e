//! Dependency edge storage.

use super::tasks::get_task_internal;
use super::Database;
use crate::store::{dedupe_dependencies, now_ms};
use crate::types::{Dependency, Task};
use anyhow::{anyhow, Result};
use rusqlite::{params, Connection};
use tracing::info;

/// Load a task's dependency edges in insertion order.
pub(super) fn load_dependencies(conn: &Connection, task_id: &str) -> Result<Vec<Dependency>> {
    let mut stmt = conn.prepare(
        "SELECT depends_on_task_id, depends_on_task_list_id FROM task_dependencies
         WHERE task_id = ?1 ORDER BY rowid",
    )?;
    let deps = stmt
        .query_map(params![task_id], |row| {
            Ok(Dependency {
                task_id: row.get(0)?,
                task_list_id: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(deps)
}

pub(super) fn insert_dependencies(
    conn: &Connection,
    task_id: &str,
    dependencies: &[Dependency],
) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO task_dependencies (task_id, depends_on_task_id, depends_on_task_list_id)
         VALUES (?1, ?2, ?3)",
    )?;
    for dep in dependencies {
        stmt.execute(params![task_id, &dep.task_id, &dep.task_list_id])?;
    }
    Ok(())
}

impl Database {
    /// Replace a task's dependency set in one transaction.
    ///
    /// No cycle check happens here; callers validate first.
    pub fn set_dependencies(&self, task_id: &str, dependencies: &[Dependency]) -> Result<Task> {
        let dependencies = dedupe_dependencies(dependencies);

        let task = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
                params![task_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(anyhow!("Task not found: {}", task_id));
            }

            tx.execute(
                "DELETE FROM task_dependencies WHERE task_id = ?1",
                params![task_id],
            )?;
            insert_dependencies(&tx, task_id, &dependencies)?;
            tx.execute(
                "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
                params![now_ms(), task_id],
            )?;

            let task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| anyhow!("Task not found: {}", task_id))?;
            tx.commit()?;
            Ok(task)
        })?;

        info!(
            task_id = %task_id,
            count = task.dependencies.len(),
            "Stored task dependencies"
        );
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewTask;

    fn setup() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let list = db.create_task_list(None, "Backlog", None).unwrap();
        for id in ["a", "b", "c"] {
            db.create_task(&NewTask::new(&list.id, id).with_id(id).with_criterion("Done"))
                .unwrap();
        }
        (db, list.id)
    }

    fn edges_into(db: &Database, target: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM task_dependencies WHERE depends_on_task_id = ?1",
                params![target],
                |row| row.get(0),
            )?)
        })
        .unwrap()
    }

    #[test]
    fn set_dependencies_replaces_previous_set() {
        let (db, list) = setup();
        db.set_dependencies("c", &[Dependency::new("a", &list)]).unwrap();
        let task = db
            .set_dependencies("c", &[Dependency::new("b", &list), Dependency::new("a", &list)])
            .unwrap();

        assert_eq!(task.dependency_ids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(edges_into(&db, "a"), 1);
    }

    #[test]
    fn set_dependencies_fails_for_unknown_task() {
        let (db, list) = setup();
        assert!(db.set_dependencies("zzz", &[Dependency::new("a", &list)]).is_err());
    }

    #[test]
    fn clearing_dependencies_leaves_empty_list() {
        let (db, list) = setup();
        db.set_dependencies("c", &[Dependency::new("a", &list)]).unwrap();
        let task = db.set_dependencies("c", &[]).unwrap();
        assert!(task.dependencies.is_empty());
        assert_eq!(edges_into(&db, "a"), 0);
    }
}
