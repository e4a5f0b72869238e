//! Blocked and ready task evaluation.

use super::reader::{GraphReader, ScopeSnapshot};
use crate::error::Result;
use crate::store::TaskStore;
use crate::types::{BlockReason, BlockedTask, Task, TaskStatus};

/// Titles listed by name in a block message before the rest are summarized.
const MAX_LISTED_TITLES: usize = 3;

/// What the evaluator needs to know about a resolved dependency target.
#[derive(Debug, Clone)]
pub struct TargetState {
    pub title: String,
    pub completed: bool,
}

impl From<&Task> for TargetState {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            completed: task.is_completed(),
        }
    }
}

/// Title shown for a dependency whose target no longer exists.
pub fn missing_task_title(task_id: &str) -> String {
    format!("Unknown task ({})", task_id)
}

/// Agent-readable summary of what blocks a task.
pub fn block_message(titles: &[String]) -> String {
    let count = titles.len();
    if count == 1 {
        return format!(
            "This task is blocked by 1 incomplete dependency: {}",
            titles[0]
        );
    }

    let listed = titles[..count.min(MAX_LISTED_TITLES)].join(", ");
    let mut message = format!(
        "This task is blocked by {} incomplete dependencies: {}",
        count, listed
    );
    if count > MAX_LISTED_TITLES {
        message.push_str(&format!(", and {} more", count - MAX_LISTED_TITLES));
    }
    message
}

/// Compute the block reason for `task`, resolving each target through `resolve`.
///
/// Returns `None` when the task has no dependencies or all of them are COMPLETED.
pub fn block_reason<F>(task: &Task, mut resolve: F) -> anyhow::Result<Option<BlockReason>>
where
    F: FnMut(&str) -> anyhow::Result<Option<TargetState>>,
{
    let mut ids = Vec::new();
    let mut titles = Vec::new();

    for target in task.dependency_ids() {
        match resolve(target)? {
            Some(state) if state.completed => {}
            Some(state) => {
                ids.push(target.to_string());
                titles.push(state.title);
            }
            None => {
                ids.push(target.to_string());
                titles.push(missing_task_title(target));
            }
        }
    }

    if ids.is_empty() {
        return Ok(None);
    }

    Ok(Some(BlockReason {
        is_blocked: true,
        message: block_message(&titles),
        blocking_task_ids: ids,
        blocking_task_titles: titles,
    }))
}

/// Block reason for a member of `snapshot`, resolved against the snapshot.
pub fn evaluate_in(snapshot: &ScopeSnapshot, task: &Task) -> Option<BlockReason> {
    let resolved: anyhow::Result<Option<BlockReason>> =
        block_reason(task, |id| Ok(snapshot.lookup(id).map(TargetState::from)));
    // The snapshot resolver never fails
    resolved.ok().flatten()
}

/// Whether a status makes a task eligible to start under the agent-mode policy.
pub fn is_ready_status(status: TaskStatus, multi_agent_mode: bool) -> bool {
    match status {
        TaskStatus::NotStarted => true,
        TaskStatus::InProgress => !multi_agent_mode,
        TaskStatus::Blocked | TaskStatus::Completed => false,
    }
}

/// Ready members of `snapshot` in natural order.
pub fn ready_in(snapshot: &ScopeSnapshot, multi_agent_mode: bool) -> Vec<Task> {
    snapshot
        .tasks()
        .filter(|t| is_ready_status(t.status, multi_agent_mode))
        .filter(|t| evaluate_in(snapshot, t).is_none())
        .cloned()
        .collect()
}

/// Blocked, not-yet-completed members of `snapshot` in natural order.
pub fn blocked_in(snapshot: &ScopeSnapshot) -> Vec<BlockedTask> {
    snapshot
        .tasks()
        .filter(|t| !t.is_completed())
        .filter_map(|t| {
            evaluate_in(snapshot, t).map(|reason| BlockedTask {
                task: t.clone(),
                reason,
            })
        })
        .collect()
}

/// Computes blocking state from the current store contents.
pub struct BlockingEvaluator<'a, S: TaskStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TaskStore + ?Sized> BlockingEvaluator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Block reason for a single task, fetching each target fresh.
    pub fn evaluate_task(&self, task: &Task) -> Result<Option<BlockReason>> {
        let reason = block_reason(task, |id| {
            Ok(self.store.get_task(id)?.as_ref().map(TargetState::from))
        })?;
        Ok(reason)
    }

    /// Tasks in the scope that can be started now.
    ///
    /// Multi-agent mode only offers NOT_STARTED tasks so two agents never pick
    /// up the same in-progress task.
    pub fn ready_tasks(
        &self,
        scope_type: &str,
        scope_id: &str,
        multi_agent_mode: bool,
    ) -> Result<Vec<Task>> {
        let snapshot = GraphReader::new(self.store).load_scope(scope_type, scope_id)?;
        Ok(ready_in(&snapshot, multi_agent_mode))
    }

    /// Tasks in the scope that are waiting on incomplete dependencies.
    pub fn blocked_tasks(&self, scope_type: &str, scope_id: &str) -> Result<Vec<BlockedTask>> {
        let snapshot = GraphReader::new(self.store).load_scope(scope_type, scope_id)?;
        Ok(blocked_in(&snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dependency, Scope};

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn task(id: &str, status: TaskStatus, deps: &[&str]) -> Task {
        Task {
            id: id.to_string(),
            task_list_id: "l".to_string(),
            title: id.to_uppercase(),
            description: None,
            status,
            dependencies: deps.iter().map(|d| Dependency::new(*d, "l")).collect(),
            exit_criteria: vec![],
            created_at: 0,
            updated_at: 0,
        }
    }

    fn snapshot(tasks: Vec<Task>) -> ScopeSnapshot {
        ScopeSnapshot::build(Scope::task_list("l"), tasks, |_| Ok(None)).unwrap()
    }

    #[test]
    fn message_for_one_blocker() {
        assert_eq!(
            block_message(&titles(&["Design"])),
            "This task is blocked by 1 incomplete dependency: Design"
        );
    }

    #[test]
    fn message_for_two_and_three_blockers() {
        assert_eq!(
            block_message(&titles(&["Design", "Review"])),
            "This task is blocked by 2 incomplete dependencies: Design, Review"
        );
        assert_eq!(
            block_message(&titles(&["A", "B", "C"])),
            "This task is blocked by 3 incomplete dependencies: A, B, C"
        );
    }

    #[test]
    fn message_summarizes_beyond_three() {
        assert_eq!(
            block_message(&titles(&["A", "B", "C", "D", "E"])),
            "This task is blocked by 5 incomplete dependencies: A, B, C, and 2 more"
        );
    }

    #[test]
    fn no_dependencies_means_not_blocked() {
        let t = task("a", TaskStatus::NotStarted, &[]);
        let snap = snapshot(vec![t.clone()]);
        assert!(evaluate_in(&snap, &t).is_none());
    }

    #[test]
    fn missing_target_blocks_with_placeholder_title() {
        let t = task("a", TaskStatus::NotStarted, &["gone"]);
        let snap = snapshot(vec![t.clone()]);
        let reason = evaluate_in(&snap, &t).unwrap();
        assert_eq!(reason.blocking_task_ids, vec!["gone"]);
        assert_eq!(reason.blocking_task_titles, vec!["Unknown task (gone)"]);
        assert!(reason.is_blocked);
    }

    #[test]
    fn only_incomplete_targets_are_reported() {
        let a = task("a", TaskStatus::NotStarted, &["b", "c", "d"]);
        let b = task("b", TaskStatus::Completed, &[]);
        let c = task("c", TaskStatus::InProgress, &[]);
        let d = task("d", TaskStatus::Blocked, &[]);
        let snap = snapshot(vec![a.clone(), b, c, d]);

        let reason = evaluate_in(&snap, &a).unwrap();
        assert_eq!(reason.blocking_task_ids, vec!["c", "d"]);
        assert_eq!(
            reason.message,
            "This task is blocked by 2 incomplete dependencies: C, D"
        );
    }

    #[test]
    fn ready_status_policy_depends_on_agent_mode() {
        assert!(is_ready_status(TaskStatus::NotStarted, true));
        assert!(!is_ready_status(TaskStatus::InProgress, true));
        assert!(is_ready_status(TaskStatus::InProgress, false));
        assert!(!is_ready_status(TaskStatus::Blocked, false));
        assert!(!is_ready_status(TaskStatus::Completed, false));
    }

    #[test]
    fn ready_in_keeps_natural_order() {
        let snap = snapshot(vec![
            task("z", TaskStatus::NotStarted, &[]),
            task("m", TaskStatus::InProgress, &[]),
            task("a", TaskStatus::NotStarted, &["z"]),
        ]);

        let single: Vec<String> = ready_in(&snap, false).into_iter().map(|t| t.id).collect();
        assert_eq!(single, vec!["z", "m"]);

        let multi: Vec<String> = ready_in(&snap, true).into_iter().map(|t| t.id).collect();
        assert_eq!(multi, vec!["z"]);
    }

    #[test]
    fn blocked_in_skips_completed_tasks() {
        let snap = snapshot(vec![
            task("a", TaskStatus::NotStarted, &["c"]),
            task("b", TaskStatus::Completed, &["c"]),
            task("c", TaskStatus::NotStarted, &[]),
        ]);
        let blocked: Vec<String> = blocked_in(&snap).into_iter().map(|b| b.task.id).collect();
        assert_eq!(blocked, vec!["a"]);
    }
}
