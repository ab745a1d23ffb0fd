//! Core engine for rail-affected
//!
//! - **config**: `AnalysisConfig` and rail.toml parsing
//! - **context**: Unified workspace context, loaded once in main
//! - **error**: Error types with contextual help messages and exit codes
//! - **vcs**: Git operations (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
