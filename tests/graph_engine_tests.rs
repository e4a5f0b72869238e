//! Integration tests for the dependency graph engine.
//!
//! These run the validator, evaluator, and analyzer end to end against an
//! in-memory SQLite store through the `TaskGraph` entry point.

use task_deps::db::Database;
use task_deps::error::GraphError;
use task_deps::graph::{DependencyValidator, GraphFormat, TaskGraph};
use task_deps::types::{CriterionStatus, Dependency, NewTask, TaskStatus};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> TaskGraph<Database> {
    TaskGraph::new(Database::open_in_memory().expect("Failed to create in-memory database"))
}

fn new_list(graph: &TaskGraph<Database>, project_id: Option<&str>) -> String {
    graph
        .create_task_list(project_id, "Backlog", None)
        .expect("Failed to create task list")
        .id
}

fn add_task(graph: &TaskGraph<Database>, list_id: &str, id: &str, title: &str) {
    graph
        .create_task(
            NewTask::new(list_id, title)
                .with_id(id)
                .with_criterion("Done"),
        )
        .expect("Failed to create task");
}

fn depend(graph: &TaskGraph<Database>, task_id: &str, targets: &[&str]) {
    let targets: Vec<String> = targets.iter().map(|s| s.to_string()).collect();
    graph
        .add_dependencies(task_id, &targets)
        .expect("Failed to add dependencies");
}

fn complete(graph: &TaskGraph<Database>, task_id: &str) {
    graph
        .set_criterion_status(task_id, 0, CriterionStatus::Complete, None)
        .expect("Failed to complete criterion");
    graph
        .update_status(task_id, TaskStatus::Completed)
        .expect("Failed to complete task");
}

fn ready_ids(graph: &TaskGraph<Database>, list_id: &str, multi_agent: bool) -> Vec<String> {
    graph
        .ready_tasks("task_list", list_id, multi_agent)
        .expect("Failed to list ready tasks")
        .into_iter()
        .map(|t| t.id)
        .collect()
}

mod validation_tests {
    use super::*;

    #[test]
    fn acyclic_edges_added_incrementally_are_accepted() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        for id in ["a", "b", "c", "d"] {
            add_task(&graph, &list, id, id);
        }

        let validator = graph.validator();
        let steps = [("b", "a"), ("c", "a"), ("d", "b"), ("d", "c")];
        for (task, target) in steps {
            let mut deps = graph.get_task(task).unwrap().dependencies;
            deps.push(Dependency::new(target, &list));
            assert!(!validator.detect_cycle(task, &deps).unwrap());
            validator.validate(task, &list, &deps).unwrap();
            depend(&graph, task, &[target]);
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");

        let err = graph
            .add_dependencies("a", &["a".to_string()])
            .unwrap_err();
        assert!(matches!(err, GraphError::Validation(_)));
        assert_eq!(err.to_string(), "would create circular dependency");
    }

    #[test]
    fn transitive_cycle_is_rejected() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        for id in ["a", "b", "c"] {
            add_task(&graph, &list, id, id);
        }
        depend(&graph, "b", &["a"]);
        depend(&graph, "c", &["b"]);

        let candidates = vec![Dependency::new("c", &list)];
        assert!(graph.validator().detect_cycle("a", &candidates).unwrap());
        assert!(matches!(
            graph.add_dependencies("a", &["c".to_string()]),
            Err(GraphError::Validation(_))
        ));
    }

    #[test]
    fn cycle_across_task_lists_is_rejected() {
        let graph = setup_db();
        let project = graph.create_project("Launch", None).unwrap();
        let backend = new_list(&graph, Some(&project.id));
        let frontend = new_list(&graph, Some(&project.id));
        add_task(&graph, &backend, "api", "API");
        add_task(&graph, &frontend, "ui", "UI");

        depend(&graph, "ui", &["api"]);
        let err = graph
            .add_dependencies("api", &["ui".to_string()])
            .unwrap_err();
        assert_eq!(err.to_string(), "would create circular dependency");
    }

    #[test]
    fn missing_target_is_rejected_before_cycle_check() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");

        let err = graph
            .add_dependencies("a", &["ghost".to_string()])
            .unwrap_err();
        assert!(matches!(&err, GraphError::MissingTarget(id) if id == "ghost"));
        assert_eq!(err.to_string(), "target task does not exist");
    }

    #[test]
    fn validator_rejects_the_whole_set() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");
        add_task(&graph, &list, "b", "B");

        let validator = DependencyValidator::new(graph.store());
        let good = vec![Dependency::new("a", &list)];
        validator.validate("b", &list, &good).unwrap();

        let mixed = vec![Dependency::new("a", &list), Dependency::new("ghost", &list)];
        assert!(matches!(
            validator.validate("b", &list, &mixed),
            Err(GraphError::MissingTarget(_))
        ));
    }
}

mod blocking_tests {
    use super::*;

    #[test]
    fn task_without_dependencies_is_not_blocked() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");

        assert!(graph.evaluate_task("a").unwrap().is_none());
    }

    #[test]
    fn message_names_both_blockers() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "design", "Design");
        add_task(&graph, &list, "review", "Review");
        add_task(&graph, &list, "ship", "Ship");
        depend(&graph, "ship", &["design", "review"]);

        let reason = graph.evaluate_task("ship").unwrap().unwrap();
        assert!(reason.is_blocked);
        assert_eq!(reason.blocking_task_ids, vec!["design", "review"]);
        assert_eq!(
            reason.message,
            "This task is blocked by 2 incomplete dependencies: Design, Review"
        );
    }

    #[test]
    fn completed_dependencies_drop_out_of_the_reason() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "design", "Design");
        add_task(&graph, &list, "review", "Review");
        add_task(&graph, &list, "ship", "Ship");
        depend(&graph, "ship", &["design", "review"]);

        complete(&graph, "design");
        let reason = graph.evaluate_task("ship").unwrap().unwrap();
        assert_eq!(reason.blocking_task_ids, vec!["review"]);
        assert_eq!(
            reason.message,
            "This task is blocked by 1 incomplete dependency: Review"
        );

        complete(&graph, "review");
        assert!(graph.evaluate_task("ship").unwrap().is_none());
    }

    #[test]
    fn deleted_target_blocks_with_placeholder_title() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");
        add_task(&graph, &list, "b", "B");
        depend(&graph, "b", &["a"]);

        assert!(graph.delete_task("a").unwrap());
        let reason = graph.evaluate_task("b").unwrap().unwrap();
        assert_eq!(reason.blocking_task_ids, vec!["a"]);
        assert_eq!(reason.blocking_task_titles, vec!["Unknown task (a)"]);
    }

    #[test]
    fn adding_beside_a_deleted_target_keeps_the_dangling_edge() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");
        add_task(&graph, &list, "b", "B");
        add_task(&graph, &list, "c", "C");
        depend(&graph, "b", &["a"]);
        assert!(graph.delete_task("a").unwrap());

        let task = graph.add_dependencies("b", &["c".to_string()]).unwrap();
        assert_eq!(task.dependency_ids().collect::<Vec<_>>(), vec!["a", "c"]);

        let reason = graph.evaluate_task("b").unwrap().unwrap();
        assert_eq!(reason.blocking_task_ids, vec!["a", "c"]);
        assert_eq!(reason.blocking_task_titles, vec!["Unknown task (a)", "C"]);
    }

    #[test]
    fn adding_a_missing_target_still_fails_beside_a_dangling_edge() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");
        add_task(&graph, &list, "b", "B");
        depend(&graph, "b", &["a"]);
        graph.delete_task("a").unwrap();

        let err = graph.add_dependencies("b", &["ghost".to_string()]).unwrap_err();
        assert!(matches!(err, GraphError::MissingTarget(_)));
        assert_eq!(
            graph.get_task("b").unwrap().dependency_ids().collect::<Vec<_>>(),
            vec!["a"]
        );
    }

    #[test]
    fn removing_dependency_unblocks_dependent() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");
        add_task(&graph, &list, "b", "B");
        depend(&graph, "b", &["a"]);

        assert!(graph.evaluate_task("b").unwrap().is_some());
        graph.remove_dependency("b", "a").unwrap();
        assert!(graph.evaluate_task("b").unwrap().is_none());
        assert_eq!(ready_ids(&graph, &list, false), vec!["a", "b"]);
    }

    #[test]
    fn unknown_task_is_not_found() {
        let graph = setup_db();
        assert!(matches!(
            graph.evaluate_task("nope"),
            Err(GraphError::TaskNotFound(_))
        ));
    }
}

mod ready_tests {
    use super::*;

    #[test]
    fn chain_releases_one_task_at_a_time() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");
        add_task(&graph, &list, "b", "B");
        add_task(&graph, &list, "c", "C");
        depend(&graph, "a", &["b"]);
        depend(&graph, "b", &["c"]);

        assert_eq!(ready_ids(&graph, &list, false), vec!["c"]);
        complete(&graph, "c");
        assert_eq!(ready_ids(&graph, &list, false), vec!["b"]);
        complete(&graph, "b");
        assert_eq!(ready_ids(&graph, &list, false), vec!["a"]);
    }

    #[test]
    fn multi_agent_mode_hides_in_progress_tasks() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");
        add_task(&graph, &list, "b", "B");
        graph.update_status("a", TaskStatus::InProgress).unwrap();

        assert_eq!(ready_ids(&graph, &list, false), vec!["a", "b"]);
        assert_eq!(ready_ids(&graph, &list, true), vec!["b"]);
    }

    #[test]
    fn blocked_status_is_never_ready() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");
        graph.update_status("a", TaskStatus::Blocked).unwrap();

        assert!(ready_ids(&graph, &list, false).is_empty());
    }

    #[test]
    fn project_scope_follows_list_then_task_order() {
        let graph = setup_db();
        let project = graph.create_project("Launch", None).unwrap();
        let first = new_list(&graph, Some(&project.id));
        let second = new_list(&graph, Some(&project.id));
        add_task(&graph, &second, "s1", "S1");
        add_task(&graph, &first, "f1", "F1");
        add_task(&graph, &first, "f2", "F2");

        let ids: Vec<String> = graph
            .ready_tasks("project", &project.id, false)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["f1", "f2", "s1"]);
    }

    #[test]
    fn out_of_scope_dependency_still_blocks() {
        let graph = setup_db();
        let other = new_list(&graph, None);
        let list = new_list(&graph, None);
        add_task(&graph, &other, "vendor", "Vendor");
        add_task(&graph, &list, "build", "Build");
        depend(&graph, "build", &["vendor"]);

        assert!(ready_ids(&graph, &list, false).is_empty());
        let blocked = graph.blocked_tasks("task_list", &list).unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].reason.blocking_task_titles, vec!["Vendor"]);

        complete(&graph, "vendor");
        assert_eq!(ready_ids(&graph, &list, false), vec!["build"]);
        assert!(graph.blocked_tasks("task_list", &list).unwrap().is_empty());
    }
}

mod analysis_tests {
    use super::*;

    #[test]
    fn linear_chain_length_equals_task_count() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        let k = 6;
        for i in 0..k {
            let id = format!("t{}", i);
            add_task(&graph, &list, &id, &format!("Step {}", i));
            if i > 0 {
                let prev = format!("t{}", i - 1);
                depend(&graph, &id, &[prev.as_str()]);
            }
        }

        let result = graph.analyze("task_list", &list).unwrap();
        assert_eq!(result.critical_path_length, k);
        let expected: Vec<String> = (0..k).map(|i| format!("t{}", i)).collect();
        assert_eq!(result.critical_path, expected);
    }

    #[test]
    fn branches_take_the_longest() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "root", "Root");

        // Branch lengths 1, 3, and 2 hanging off the root
        let branches: [&[&str]; 3] = [&["x1"], &["y1", "y2", "y3"], &["z1", "z2"]];
        for branch in branches {
            let mut prev = "root";
            for &id in branch {
                add_task(&graph, &list, id, id);
                depend(&graph, id, &[prev]);
                prev = id;
            }
        }

        let result = graph.analyze("task_list", &list).unwrap();
        assert_eq!(result.critical_path_length, 4);
        assert_eq!(result.critical_path, vec!["root", "y1", "y2", "y3"]);
    }

    #[test]
    fn progress_counts_completed_members() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        for id in ["a", "b", "c"] {
            add_task(&graph, &list, id, id);
        }
        complete(&graph, "b");

        let result = graph.analyze("task_list", &list).unwrap();
        assert_eq!(result.total_tasks, 3);
        assert_eq!(result.completed_tasks, 1);
        assert!((result.completion_progress - 100.0 / 3.0).abs() < 0.01);
    }

    #[test]
    fn empty_scope_has_zero_progress() {
        let graph = setup_db();
        let list = new_list(&graph, None);

        let result = graph.analyze("task_list", &list).unwrap();
        assert_eq!(result.total_tasks, 0);
        assert_eq!(result.completion_progress, 0.0);
        assert!(result.critical_path.is_empty());
        assert_eq!(result.critical_path_length, 0);
    }

    #[test]
    fn stored_cycle_fails_analysis() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");
        add_task(&graph, &list, "b", "B");
        add_task(&graph, &list, "c", "C");
        depend(&graph, "b", &["a"]);

        // Bypass validation to plant a cycle
        graph
            .store()
            .set_dependencies("a", &[Dependency::new("b", &list)])
            .unwrap();

        match graph.analyze("task_list", &list) {
            Err(GraphError::GraphIntegrity { unresolved }) => {
                assert_eq!(unresolved, vec!["a", "b"]);
            }
            other => panic!("expected integrity error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_scope_is_a_scope_error() {
        let graph = setup_db();
        assert!(matches!(
            graph.analyze("sprint", "x"),
            Err(GraphError::Scope(_))
        ));
        assert!(matches!(
            graph.analyze("project", "missing"),
            Err(GraphError::Scope(_))
        ));
        assert!(matches!(
            graph.ready_tasks("task_list", "missing", false),
            Err(GraphError::Scope(_))
        ));
    }
}

mod render_tests {
    use super::*;

    #[test]
    fn graph_renders_scope_edges() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "Design");
        add_task(&graph, &list, "b", "Build");
        depend(&graph, "b", &["a"]);

        let dot = graph.render("task_list", &list, GraphFormat::Dot).unwrap();
        assert!(dot.contains("\"a\" -> \"b\";"));

        let mermaid = graph
            .render("task_list", &list, GraphFormat::Mermaid)
            .unwrap();
        assert!(mermaid.contains("n0 --> n1"));
    }
}

mod facade_tests {
    use super::*;

    #[test]
    fn create_task_with_dependencies_is_validated() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");

        let task = graph
            .create_task(
                NewTask::new(&list, "B")
                    .with_id("b")
                    .with_criterion("Done")
                    .with_dependency(Dependency::new("a", &list)),
            )
            .unwrap();
        assert_eq!(task.dependency_ids().collect::<Vec<_>>(), vec!["a"]);

        // A task cannot be created depending on itself
        let err = graph
            .create_task(
                NewTask::new(&list, "C")
                    .with_id("c")
                    .with_criterion("Done")
                    .with_dependency(Dependency::new("c", &list)),
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::MissingTarget(_)));
        assert!(graph.store().get_task("c").unwrap().is_none());
    }

    #[test]
    fn completing_requires_exit_criteria() {
        let graph = setup_db();
        let list = new_list(&graph, None);
        add_task(&graph, &list, "a", "A");

        assert!(graph.update_status("a", TaskStatus::Completed).is_err());
        complete(&graph, "a");
        assert_eq!(graph.get_task("a").unwrap().status, TaskStatus::Completed);
    }
}
