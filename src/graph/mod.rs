//! Dependency graph engine.
//!
//! - [`GraphReader`] loads a scope into a [`ScopeSnapshot`].
//! - [`DependencyValidator`] keeps cycles and dangling targets out of the store.
//! - [`GraphAnalyzer`] computes the critical path and completion progress.
//! - [`BlockingEvaluator`] works out blocked and ready tasks.
//!
//! Every call reads the store afresh; nothing is cached between calls. The
//! algorithms themselves are free functions over a snapshot.

pub mod analyzer;
pub mod blocking;
pub mod reader;
pub mod render;
pub mod task_graph;
pub mod validator;

pub use analyzer::{analyze_snapshot, GraphAnalyzer};
pub use blocking::{block_message, BlockingEvaluator};
pub use reader::{GraphReader, ScopeSnapshot};
pub use render::GraphFormat;
pub use task_graph::TaskGraph;
pub use validator::{creates_cycle, DependencyValidator};
