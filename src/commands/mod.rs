//! CLI commands for rail-affected
//!
//! - **affected**: Find packages affected by changes
//! - **graph**: Inspect the workspace dependency graph
//!
//! All commands accept `&WorkspaceContext` to avoid redundant workspace loads.

pub mod affected;
pub mod graph;

pub use affected::{AffectedOptions, run_affected};
pub use graph::run_graph;
