//! Write-time dependency validation: target existence and cycle prevention.

use crate::error::{GraphError, Result};
use crate::store::TaskStore;
use crate::types::Dependency;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Check whether giving `task_id` the outgoing edges `candidates` closes a cycle.
///
/// Every other task's outgoing edges come from `dependencies_of`. The walk
/// uses an explicit stack and a visited set, so chain length is bounded only
/// by memory. Candidates are considered jointly.
pub fn creates_cycle<F>(
    task_id: &str,
    candidates: &[Dependency],
    mut dependencies_of: F,
) -> anyhow::Result<bool>
where
    F: FnMut(&str) -> anyhow::Result<Vec<String>>,
{
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = candidates.iter().rev().map(|d| d.task_id.clone()).collect();

    while let Some(current) = stack.pop() {
        if current == task_id {
            return Ok(true);
        }
        if !visited.insert(current.clone()) {
            continue;
        }

        for next in dependencies_of(&current)? {
            if !visited.contains(&next) {
                stack.push(next);
            }
        }
    }

    Ok(false)
}

/// Validates candidate dependency sets against the current store contents.
pub struct DependencyValidator<'a, S: TaskStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TaskStore + ?Sized> DependencyValidator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Accept or reject `candidates` as the dependency set of `task_id`.
    ///
    /// Each target is fetched individually since it may live outside the
    /// source task's list. The set is rejected as a whole.
    pub fn validate(
        &self,
        task_id: &str,
        task_list_id: &str,
        candidates: &[Dependency],
    ) -> Result<()> {
        for dep in candidates {
            if self.store.get_task(&dep.task_id)?.is_none() {
                warn!(
                    task_id = %task_id,
                    task_list_id = %task_list_id,
                    target = %dep.task_id,
                    "Rejected dependency on missing task"
                );
                return Err(GraphError::MissingTarget(dep.task_id.clone()));
            }
        }

        self.ensure_acyclic(task_id, task_list_id, candidates)
    }

    /// Cycle check alone. Existing edges to deleted tasks are left alone,
    /// so merges onto a set that already dangles still go through.
    pub fn ensure_acyclic(
        &self,
        task_id: &str,
        task_list_id: &str,
        candidates: &[Dependency],
    ) -> Result<()> {
        if self.detect_cycle(task_id, candidates)? {
            warn!(
                task_id = %task_id,
                task_list_id = %task_list_id,
                candidates = candidates.len(),
                "Rejected dependencies that would create a cycle"
            );
            return Err(GraphError::circular_dependency());
        }

        debug!(task_id = %task_id, candidates = candidates.len(), "Dependencies validated");
        Ok(())
    }

    /// Whether `candidates` as the outgoing edges of `task_id` would close a
    /// cycle through the persisted dependencies of other tasks.
    pub fn detect_cycle(&self, task_id: &str, candidates: &[Dependency]) -> Result<bool> {
        let found = creates_cycle(task_id, candidates, |id| {
            Ok(self
                .store
                .get_task(id)?
                .map(|t| t.dependencies.into_iter().map(|d| d.task_id).collect())
                .unwrap_or_default())
        })?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::types::NewTask;
    use std::collections::HashMap;

    fn edges(pairs: &[(&str, Vec<&str>)]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn check(graph: &HashMap<String, Vec<String>>, task: &str, candidates: &[&str]) -> bool {
        let candidates: Vec<Dependency> =
            candidates.iter().map(|c| Dependency::new(*c, "l")).collect();
        creates_cycle(task, &candidates, |id| {
            Ok(graph.get(id).cloned().unwrap_or_default())
        })
        .unwrap()
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        assert!(check(&HashMap::new(), "a", &["a"]));
    }

    #[test]
    fn transitive_cycle_is_detected() {
        // b -> c -> a, so a -> b closes the loop
        let graph = edges(&[("b", vec!["c"]), ("c", vec!["a"])]);
        assert!(check(&graph, "a", &["b"]));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let graph = edges(&[("b", vec!["d"]), ("c", vec!["d"]), ("d", vec![])]);
        assert!(!check(&graph, "a", &["b", "c"]));
    }

    #[test]
    fn persisted_edges_of_the_source_are_ignored() {
        // a's stored edge to b is replaced by the candidates
        let graph = edges(&[("a", vec!["b"]), ("b", vec![])]);
        assert!(!check(&graph, "a", &["b"]));
    }

    #[test]
    fn cycle_through_a_later_candidate_still_counts() {
        let graph = edges(&[("b", vec![]), ("c", vec!["a"])]);
        assert!(check(&graph, "a", &["b", "c"]));
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let n = 50_000;
        let graph: HashMap<String, Vec<String>> = (0..n)
            .map(|i| {
                let next = if i + 1 < n { vec![format!("t{}", i + 1)] } else { vec![] };
                (format!("t{}", i), next)
            })
            .collect();
        assert!(!check(&graph, "src", &["t0"]));
        assert!(check(&graph, &format!("t{}", n - 1), &["t0"]));
    }

    #[test]
    fn validate_rejects_missing_target_before_cycle_check() {
        let db = Database::open_in_memory().unwrap();
        let list = db.create_task_list(None, "L", None).unwrap();
        db.create_task(&NewTask::new(&list.id, "A").with_id("a").with_criterion("Done"))
            .unwrap();

        let validator = DependencyValidator::new(&db);
        let err = validator
            .validate("a", &list.id, &[Dependency::new("ghost", &list.id)])
            .unwrap_err();
        assert!(matches!(&err, GraphError::MissingTarget(id) if id == "ghost"));
        assert_eq!(err.to_string(), "target task does not exist");
    }
}
