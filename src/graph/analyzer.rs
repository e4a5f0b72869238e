//! Critical path and completion progress over a scope.

use super::reader::{GraphReader, ScopeSnapshot};
use crate::error::{GraphError, Result};
use crate::store::TaskStore;
use crate::types::DependencyAnalysisResult;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, error};

/// Percentage of completed tasks, `0.0` for an empty scope.
pub fn completion_progress(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

/// Analyze a loaded scope.
///
/// Only member tasks and edges between members take part in the critical
/// path. Chain length counts tasks, so an isolated task has length 1.
/// Fails with [`GraphError::GraphIntegrity`] if the member graph contains a
/// cycle.
pub fn analyze_snapshot(snapshot: &ScopeSnapshot) -> Result<DependencyAnalysisResult> {
    let ids: Vec<&str> = snapshot.task_ids().collect();
    let n = ids.len();
    let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    // Edges run from a dependency to its dependents.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree: Vec<usize> = vec![0; n];
    for (i, id) in ids.iter().enumerate() {
        let mut seen = HashSet::new();
        for target in snapshot.dependencies_of(id) {
            if let Some(&j) = index.get(target.as_str()) {
                if seen.insert(j) {
                    dependents[j].push(i);
                    in_degree[i] += 1;
                }
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut longest_to: Vec<usize> = vec![1; n];
    let mut predecessor: Vec<Option<usize>> = vec![None; n];
    let mut processed = 0;

    while let Some(current) = queue.pop_front() {
        processed += 1;
        for &next in &dependents[current] {
            if longest_to[current] + 1 > longest_to[next] {
                longest_to[next] = longest_to[current] + 1;
                predecessor[next] = Some(current);
            }
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if processed < n {
        let unresolved: Vec<String> = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| ids[i].to_string())
            .collect();
        error!(
            scope = %snapshot.scope(),
            unresolved = ?unresolved,
            "Dependency cycle found during analysis"
        );
        return Err(GraphError::GraphIntegrity { unresolved });
    }

    // First node in natural order that reaches the maximum.
    let mut end: Option<usize> = None;
    for i in 0..n {
        if end.is_none_or(|e| longest_to[i] > longest_to[e]) {
            end = Some(i);
        }
    }

    let mut critical_path = Vec::new();
    let mut cursor = end;
    while let Some(i) = cursor {
        critical_path.push(ids[i].to_string());
        cursor = predecessor[i];
    }
    critical_path.reverse();

    let total_tasks = n;
    let completed_tasks = snapshot.tasks().filter(|t| t.is_completed()).count();

    Ok(DependencyAnalysisResult {
        critical_path_length: end.map_or(0, |e| longest_to[e]),
        critical_path,
        total_tasks,
        completed_tasks,
        completion_progress: completion_progress(completed_tasks, total_tasks),
    })
}

/// Runs scope analysis against the current store contents.
pub struct GraphAnalyzer<'a, S: TaskStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TaskStore + ?Sized> GraphAnalyzer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn analyze(&self, scope_type: &str, scope_id: &str) -> Result<DependencyAnalysisResult> {
        let snapshot = GraphReader::new(self.store).load_scope(scope_type, scope_id)?;
        let result = analyze_snapshot(&snapshot)?;
        debug!(
            scope = %snapshot.scope(),
            critical_path_length = result.critical_path_length,
            completed = result.completed_tasks,
            total = result.total_tasks,
            "Analyzed scope"
        );
        Ok(result)
    }
}
