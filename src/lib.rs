//! Task dependency graph engine
//!
//! Validates dependency edits against cycles, explains why tasks are
//! blocked, lists ready work, and computes critical paths for a task list
//! or project. Storage sits behind the [`store::TaskStore`] trait with a
//! SQLite adapter ([`db::Database`]) and a JSON file adapter
//! ([`store::FileStore`]).

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod graph;
pub mod logging;
pub mod store;
pub mod types;
