//! Scope loading: turns store contents into an in-memory dependency graph.

use crate::error::{GraphError, Result};
use crate::store::TaskStore;
use crate::types::{Scope, ScopeType, Task};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// In-memory view of one scope, loaded fresh for a single call.
///
/// Member tasks are the tasks of the scope in natural listing order (task
/// list order, then task insertion order). Dependency targets outside the
/// scope are resolved once and kept as external tasks; targets that do not
/// resolve at all are left out of the adjacency.
#[derive(Debug, Clone)]
pub struct ScopeSnapshot {
    scope: Scope,
    order: Vec<String>,
    tasks: HashMap<String, Task>,
    external: HashMap<String, Task>,
    edges: HashMap<String, Vec<String>>,
}

impl ScopeSnapshot {
    /// Build a snapshot from member tasks, resolving out-of-scope targets
    /// through `resolve`.
    pub fn build<F>(scope: Scope, members: Vec<Task>, mut resolve: F) -> Result<Self>
    where
        F: FnMut(&str) -> anyhow::Result<Option<Task>>,
    {
        let mut order = Vec::with_capacity(members.len());
        let mut tasks = HashMap::with_capacity(members.len());
        for task in members {
            if tasks.contains_key(&task.id) {
                continue;
            }
            order.push(task.id.clone());
            tasks.insert(task.id.clone(), task);
        }

        let mut external: HashMap<String, Task> = HashMap::new();
        let mut missing: HashSet<String> = HashSet::new();
        let mut edges: HashMap<String, Vec<String>> = HashMap::with_capacity(order.len());

        for id in &order {
            let task = &tasks[id];
            let mut targets: Vec<String> = Vec::with_capacity(task.dependencies.len());

            for target in task.dependency_ids() {
                if targets.iter().any(|t| t == target) {
                    continue;
                }
                let resolved = if tasks.contains_key(target) || external.contains_key(target) {
                    true
                } else if missing.contains(target) {
                    false
                } else {
                    match resolve(target)? {
                        Some(found) => {
                            external.insert(found.id.clone(), found);
                            true
                        }
                        None => {
                            missing.insert(target.to_string());
                            false
                        }
                    }
                };

                if resolved {
                    targets.push(target.to_string());
                } else {
                    debug!(task_id = %id, target = %target, "Dropping dependency on missing task");
                }
            }

            edges.insert(id.clone(), targets);
        }

        Ok(Self {
            scope,
            order,
            tasks,
            external,
            edges,
        })
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Member task ids in natural order.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Member tasks in natural order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().map(|id| &self.tasks[id])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// A member task or a resolved out-of-scope dependency target.
    pub fn lookup(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id).or_else(|| self.external.get(id))
    }

    pub fn is_external(&self, id: &str) -> bool {
        self.external.contains_key(id)
    }

    /// Resolved dependency targets of a member task, in stored order.
    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of resolved edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

/// Loads scopes from a task store.
pub struct GraphReader<'a, S: TaskStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TaskStore + ?Sized> GraphReader<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Parse a scope reference and load it.
    pub fn load_scope(&self, scope_type: &str, scope_id: &str) -> Result<ScopeSnapshot> {
        let scope = Scope::parse(scope_type, scope_id)?;
        self.load(&scope)
    }

    /// Load the member tasks of a scope and build its graph.
    pub fn load(&self, scope: &Scope) -> Result<ScopeSnapshot> {
        let members = self.members(scope)?;
        let snapshot = ScopeSnapshot::build(scope.clone(), members, |id| self.store.get_task(id))?;
        debug!(
            scope = %scope,
            tasks = snapshot.order.len(),
            edges = snapshot.edge_count(),
            external = snapshot.external.len(),
            "Loaded scope snapshot"
        );
        Ok(snapshot)
    }

    fn members(&self, scope: &Scope) -> Result<Vec<Task>> {
        match scope.scope_type {
            ScopeType::Project => {
                if self.store.get_project(&scope.scope_id)?.is_none() {
                    return Err(GraphError::Scope(format!(
                        "project not found: {}",
                        scope.scope_id
                    )));
                }
                let mut tasks = Vec::new();
                for list in self.store.list_task_lists(Some(&scope.scope_id))? {
                    tasks.extend(self.store.list_tasks(Some(&list.id))?);
                }
                Ok(tasks)
            }
            ScopeType::TaskList => {
                if self.store.get_task_list(&scope.scope_id)?.is_none() {
                    return Err(GraphError::Scope(format!(
                        "task list not found: {}",
                        scope.scope_id
                    )));
                }
                Ok(self.store.list_tasks(Some(&scope.scope_id))?)
            }
        }
    }
}
