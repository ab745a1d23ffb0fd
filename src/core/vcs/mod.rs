pub mod system_git;

pub use system_git::{SystemGit, validate_ref};
