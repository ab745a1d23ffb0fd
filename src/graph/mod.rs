//! Graph-aware workspace analysis
//!
//! Manifest records → `DependencyGraph` (forward + reverse name maps), changed files →
//! owning packages, owners → reverse-dependency closure. Everything here is pure and
//! in-memory; git and file access live in `core`.

pub mod affected;
pub mod paths;
pub mod traverse;
pub mod triggers;
pub mod workspace_graph;

pub use affected::{AffectedResult, FileMapping, assemble};
pub use paths::{PathMapper, WorkspacePrefix};
pub use triggers::RootTriggers;
pub use workspace_graph::DependencyGraph;
