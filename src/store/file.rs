//! File-backed task store: one JSON document per entity.
//!
//! Layout under the root directory:
//!
//! ```text
//! projects/<id>.json
//! task_lists/<id>.json
//! tasks/<id>.json
//! ```
//!
//! Each document carries a `seq` number so listings come back in insertion
//! order regardless of directory iteration order.

use super::{
    check_new_task, check_status_transition, dedupe_dependencies, new_id, now_ms, TaskStore,
    TaskWriter,
};
use crate::types::{CriterionStatus, Dependency, ExitCriterion, NewTask, Project, Task, TaskList, TaskStatus};
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

const PROJECTS_DIR: &str = "projects";
const TASK_LISTS_DIR: &str = "task_lists";
const TASKS_DIR: &str = "tasks";

/// Stored form of an entity: the entity plus its insertion sequence.
#[derive(Debug, Serialize, Deserialize)]
struct Record<T> {
    seq: u64,
    #[serde(flatten)]
    item: T,
}

/// Task store backed by JSON files in a directory.
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for dir in [PROJECTS_DIR, TASK_LISTS_DIR, TASKS_DIR] {
            fs::create_dir_all(root.join(dir))
                .with_context(|| format!("creating {}", root.join(dir).display()))?;
        }
        debug!(root = %root.display(), "Opened file task store");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    fn read<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<Option<Record<T>>> {
        // Ids that cannot be file names cannot have been stored
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.path_for(kind, id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let record = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(record))
    }

    fn read_all<T: DeserializeOwned>(&self, kind: &str) -> Result<Vec<Record<T>>> {
        let dir = self.root.join(kind);
        let mut records = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let record: Record<T> = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            records.push(record);
        }
        records.sort_by_key(|r| r.seq);
        Ok(records)
    }

    /// Write a record atomically: temp file, then rename over the target.
    fn write<T: Serialize>(&self, kind: &str, id: &str, record: &Record<T>) -> Result<()> {
        let path = self.path_for(kind, id);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(record)?;
        fs::write(&tmp, content).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    fn next_seq(&self, kind: &str) -> Result<u64> {
        let max = self
            .read_all::<serde_json::Value>(kind)?
            .iter()
            .map(|r| r.seq)
            .max();
        Ok(max.map_or(0, |m| m + 1))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| anyhow!("file store write lock poisoned"))
    }

    /// Read-modify-write a task under the write lock.
    fn modify_task<F>(&self, task_id: &str, f: F) -> Result<Task>
    where
        F: FnOnce(&mut Task) -> Result<()>,
    {
        let _guard = self.lock()?;
        let mut record: Record<Task> = self
            .read(TASKS_DIR, task_id)?
            .ok_or_else(|| anyhow!("Task not found: {}", task_id))?;
        f(&mut record.item)?;
        record.item.updated_at = now_ms();
        self.write(TASKS_DIR, task_id, &record)?;
        Ok(record.item)
    }
}

/// Ids double as file names, so keep them to a safe alphabet.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl TaskStore for FileStore {
    fn get_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.read::<Task>(TASKS_DIR, id)?.map(|r| r.item))
    }

    fn list_tasks(&self, task_list_id: Option<&str>) -> Result<Vec<Task>> {
        Ok(self
            .read_all::<Task>(TASKS_DIR)?
            .into_iter()
            .map(|r| r.item)
            .filter(|t| task_list_id.is_none_or(|lid| t.task_list_id == lid))
            .collect())
    }

    fn list_task_lists(&self, project_id: Option<&str>) -> Result<Vec<TaskList>> {
        Ok(self
            .read_all::<TaskList>(TASK_LISTS_DIR)?
            .into_iter()
            .map(|r| r.item)
            .filter(|l| project_id.is_none_or(|pid| l.project_id.as_deref() == Some(pid)))
            .collect())
    }

    fn get_task_list(&self, id: &str) -> Result<Option<TaskList>> {
        Ok(self.read::<TaskList>(TASK_LISTS_DIR, id)?.map(|r| r.item))
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.read::<Project>(PROJECTS_DIR, id)?.map(|r| r.item))
    }
}

impl TaskWriter for FileStore {
    fn create_project(&self, name: &str, description: Option<&str>) -> Result<Project> {
        if name.trim().is_empty() {
            return Err(anyhow!("project name must not be empty"));
        }
        let _guard = self.lock()?;
        let now = now_ms();
        let record = Record {
            seq: self.next_seq(PROJECTS_DIR)?,
            item: Project {
                id: new_id(),
                name: name.to_string(),
                description: description.map(String::from),
                created_at: now,
                updated_at: now,
            },
        };
        self.write(PROJECTS_DIR, &record.item.id, &record)?;
        info!(project_id = %record.item.id, name = %record.item.name, "Created project");
        Ok(record.item)
    }

    fn create_task_list(
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
        let _guard = self.lock()?;
        let now = now_ms();
        let record = Record {
            seq: self.next_seq(TASK_LISTS_DIR)?,
            item: TaskList {
                id: new_id(),
                project_id: project_id.map(String::from),
                title: title.to_string(),
                description: description.map(String::from),
                created_at: now,
                updated_at: now,
            },
        };
        self.write(TASK_LISTS_DIR, &record.item.id, &record)?;
        info!(task_list_id = %record.item.id, title = %record.item.title, "Created task list");
        Ok(record.item)
    }

    fn create_task(&self, input: &NewTask) -> Result<Task> {
        check_new_task(input)?;
        let id = input
            .id
            .clone()
            .ok_or_else(|| anyhow!("task id must be assigned before persisting"))?;
        if !is_valid_id(&id) {
            return Err(anyhow!("invalid task id '{}'", id));
        }
        if self.get_task_list(&input.task_list_id)?.is_none() {
            return Err(anyhow!("Task list not found: {}", input.task_list_id));
        }

        let _guard = self.lock()?;
        if self.path_for(TASKS_DIR, &id).exists() {
            return Err(anyhow!("Task already exists: {}", id));
        }
        let now = now_ms();
        let record = Record {
            seq: self.next_seq(TASKS_DIR)?,
            item: Task {
                id: id.clone(),
                task_list_id: input.task_list_id.clone(),
                title: input.title.clone(),
                description: input.description.clone(),
                status: TaskStatus::NotStarted,
                dependencies: dedupe_dependencies(&input.dependencies),
                exit_criteria: input.exit_criteria.iter().map(ExitCriterion::new).collect(),
                created_at: now,
                updated_at: now,
            },
        };
        self.write(TASKS_DIR, &id, &record)?;
        info!(task_id = %id, task_list_id = %input.task_list_id, "Created task");
        Ok(record.item)
    }

    fn set_dependencies(&self, task_id: &str, dependencies: &[Dependency]) -> Result<Task> {
        let dependencies = dedupe_dependencies(dependencies);
        let task = self.modify_task(task_id, |task| {
            task.dependencies = dependencies;
            Ok(())
        })?;
        info!(
            task_id = %task_id,
            count = task.dependencies.len(),
            "Stored task dependencies"
        );
        Ok(task)
    }

    fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<Task> {
        let task = self.modify_task(task_id, |task| {
            check_status_transition(task, status)?;
            task.status = status;
            Ok(())
        })?;
        info!(task_id = %task_id, status = %status, "Updated task status");
        Ok(task)
    }

    fn set_criterion_status(
        &self,
        task_id: &str,
        index: usize,
        status: CriterionStatus,
        comment: Option<&str>,
    ) -> Result<Task> {
        self.modify_task(task_id, |task| {
            let count = task.exit_criteria.len();
            let criterion = task.exit_criteria.get_mut(index).ok_or_else(|| {
                anyhow!(
                    "Exit criterion {} out of range: task {} has {}",
                    index,
                    task_id,
                    count
                )
            })?;
            criterion.status = status;
            if let Some(comment) = comment {
                criterion.comment = Some(comment.to_string());
            }
            Ok(())
        })
    }

    fn delete_task(&self, task_id: &str) -> Result<bool> {
        if !is_valid_id(task_id) {
            return Ok(false);
        }
        let _guard = self.lock()?;
        let path = self.path_for(TASKS_DIR, task_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(task_id = %task_id, "Deleted task");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }
}
