//! SQLite adapter for the task store.

pub mod deps;
pub mod lists;
pub mod tasks;

use crate::store::{TaskStore, TaskWriter};
use crate::types::{CriterionStatus, Dependency, NewTask, Project, Task, TaskList, TaskStatus};
use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        // WAL lets readers run alongside a writer from another process
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;
        debug!(path = %path.display(), "Opened SQLite task store");

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.lock()?;
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }
}

impl TaskStore for Database {
    fn get_task(&self, id: &str) -> Result<Option<Task>> {
        Database::get_task(self, id)
    }

    fn list_tasks(&self, task_list_id: Option<&str>) -> Result<Vec<Task>> {
        Database::list_tasks(self, task_list_id)
    }

    fn list_task_lists(&self, project_id: Option<&str>) -> Result<Vec<TaskList>> {
        Database::list_task_lists(self, project_id)
    }

    fn get_task_list(&self, id: &str) -> Result<Option<TaskList>> {
        Database::get_task_list(self, id)
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>> {
        Database::get_project(self, id)
    }
}

impl TaskWriter for Database {
    fn create_project(&self, name: &str, description: Option<&str>) -> Result<Project> {
        Database::create_project(self, name, description)
    }

    fn create_task_list(
        &self,
        project_id: Option<&str>,
        title: &str,
        description: Option<&str>,
    ) -> Result<TaskList> {
        Database::create_task_list(self, project_id, title, description)
    }

    fn create_task(&self, input: &NewTask) -> Result<Task> {
        Database::create_task(self, input)
    }

    fn set_dependencies(&self, task_id: &str, dependencies: &[Dependency]) -> Result<Task> {
        Database::set_dependencies(self, task_id, dependencies)
    }

    fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<Task> {
        Database::update_status(self, task_id, status)
    }

    fn set_criterion_status(
        &self,
        task_id: &str,
        index: usize,
        status: CriterionStatus,
        comment: Option<&str>,
    ) -> Result<Task> {
        Database::set_criterion_status(self, task_id, index, status, comment)
    }

    fn delete_task(&self, task_id: &str) -> Result<bool> {
        Database::delete_task(self, task_id)
    }
}
