//! Core domain models.
//!
//! Task records are the input boundary of the dependency graph: everything
//! in `graph` is derived from them.

pub mod task;

pub use task::{DependencyRecord, TaskId, TaskRecord, TaskStatus};
