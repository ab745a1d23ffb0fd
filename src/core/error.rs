//! Error types for rail-affected with contextual messages and exit codes
//!
//! Every failure is terminal: the caller gets one error with a descriptive message
//! and, where we know one, a hint about how to fix it. Unmatched files and dependency
//! cycles are normal outcomes and never show up here.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for rail-affected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (manifest, config, invalid args)
  User = 1,
  /// System error (git, I/O)
  System = 2,
  /// Internal consistency violation (a bug, not bad input)
  Internal = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for rail-affected
#[derive(Debug)]
pub enum RailError {
  /// Malformed or contradictory workspace manifest
  Manifest(ManifestError),

  /// Graph queried with a name it does not know
  Graph(GraphError),

  /// Configuration errors (rail.toml, trigger patterns)
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RailError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RailError::Message { message, context, help } => RailError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      RailError::Io(err) => RailError::Message {
        message: format!("{}: {}", ctx_str, err),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RailError::Manifest(_) => ExitCode::User,
      RailError::Graph(_) => ExitCode::Internal,
      RailError::Config(_) => ExitCode::User,
      RailError::Git(_) => ExitCode::System,
      RailError::Io(_) => ExitCode::System,
      RailError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RailError::Manifest(e) => e.help_message(),
      RailError::Graph(_) => Some("This is a bug in rail-affected. Please report it with the manifest that triggered it.".to_string()),
      RailError::Config(e) => e.help_message(),
      RailError::Git(e) => e.help_message(),
      RailError::Message { help, .. } => help.clone(),
      RailError::Io(_) => None,
    }
  }
}

impl fmt::Display for RailError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RailError::Manifest(e) => write!(f, "{}", e),
      RailError::Graph(e) => write!(f, "{}", e),
      RailError::Config(e) => write!(f, "{}", e),
      RailError::Git(e) => write!(f, "{}", e),
      RailError::Io(e) => write!(f, "I/O error: {}", e),
      RailError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RailError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RailError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for RailError {
  fn from(err: io::Error) -> Self {
    RailError::Io(err)
  }
}

impl From<ManifestError> for RailError {
  fn from(err: ManifestError) -> Self {
    RailError::Manifest(err)
  }
}

impl From<GraphError> for RailError {
  fn from(err: GraphError) -> Self {
    RailError::Graph(err)
  }
}

impl From<ConfigError> for RailError {
  fn from(err: ConfigError) -> Self {
    RailError::Config(err)
  }
}

impl From<GitError> for RailError {
  fn from(err: GitError) -> Self {
    RailError::Git(err)
  }
}

impl From<cargo_metadata::Error> for RailError {
  fn from(err: cargo_metadata::Error) -> Self {
    RailError::message(format!("Cargo metadata error: {}", err))
  }
}

impl From<serde_json::Error> for RailError {
  fn from(err: serde_json::Error) -> Self {
    RailError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for RailError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    RailError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Malformed or contradictory workspace manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
  /// Manifest file does not exist
  NotFound { path: PathBuf },

  /// Manifest is not valid TOML
  InvalidToml { path: PathBuf, message: String },

  /// Lock file has no `[manifest]` section
  NotAWorkspace { path: PathBuf },

  /// `[manifest] members` is not an array of strings
  MembersNotArray { path: PathBuf, found: String },

  /// `[manifest] members` is empty
  NoMembers { path: PathBuf },

  /// Package declared with an empty name
  InvalidPackageName { source_path: String },

  /// Two packages share a name
  DuplicatePackage { name: String },

  /// Two non-virtual packages share a source path
  DuplicateSourcePath { path: String, first: String, second: String },

  /// Dependency reference that cannot be classified
  MalformedDependency { package: String, reason: String },

  /// Dependency on a declared member that has no package record
  UnresolvedMember { package: String, dependency: String },

  /// No supported manifest found
  UnsupportedWorkspace { root: PathBuf },
}

impl ManifestError {
  fn help_message(&self) -> Option<String> {
    match self {
      ManifestError::NotFound { .. } => {
        Some("Run from the workspace root or point at the manifest with --manifest <PATH>.".to_string())
      }
      ManifestError::NotAWorkspace { .. } | ManifestError::NoMembers { .. } => {
        Some("Regenerate the lock file with `uv lock` from the workspace root.".to_string())
      }
      ManifestError::UnresolvedMember { dependency, .. } => Some(format!(
        "'{}' is listed as a workspace member but has no editable/directory/virtual source. Run `uv lock` to refresh it.",
        dependency
      )),
      ManifestError::UnsupportedWorkspace { .. } => {
        Some("Supported: uv (uv.lock with [manifest]), Cargo (Cargo.toml with [workspace])".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ManifestError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestError::NotFound { path } => write!(f, "Manifest not found: {}", path.display()),
      ManifestError::InvalidToml { path, message } => {
        write!(f, "{} is not valid TOML: {}", path.display(), message)
      }
      ManifestError::NotAWorkspace { path } => {
        write!(f, "{} has no [manifest] section, is this a uv workspace?", path.display())
      }
      ManifestError::MembersNotArray { path, found } => {
        write!(f, "{} [manifest] members must be a list, got {}", path.display(), found)
      }
      ManifestError::NoMembers { path } => {
        write!(f, "{} has no workspace members in [manifest]", path.display())
      }
      ManifestError::InvalidPackageName { source_path } => {
        write!(f, "Package at '{}' has an empty name", source_path)
      }
      ManifestError::DuplicatePackage { name } => write!(f, "Package '{}' is declared more than once", name),
      ManifestError::DuplicateSourcePath { path, first, second } => write!(
        f,
        "Packages '{}' and '{}' share the source path '{}'",
        first, second, path
      ),
      ManifestError::MalformedDependency { package, reason } => {
        write!(f, "Malformed dependency in package '{}': {}", package, reason)
      }
      ManifestError::UnresolvedMember { package, dependency } => write!(
        f,
        "Package '{}' depends on workspace member '{}', which has no package entry",
        package, dependency
      ),
      ManifestError::UnsupportedWorkspace { root } => {
        write!(f, "No supported workspace manifest found in {}", root.display())
      }
    }
  }
}

impl std::error::Error for ManifestError {}

/// Graph consistency errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
  /// A package name handed to the graph is not one of its packages
  UnknownPackage { name: String },
}

impl fmt::Display for GraphError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GraphError::UnknownPackage { name } => write!(f, "Package '{}' is not part of the dependency graph", name),
    }
  }
}

impl std::error::Error for GraphError {}

/// Configuration-related errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  /// Config file could not be parsed
  Invalid { path: PathBuf, message: String },

  /// Root trigger pattern is not a valid glob
  InvalidTrigger { pattern: String, reason: String },

  /// Workspace root lies outside the git repository
  WorkspaceOutsideRepo { workspace_root: PathBuf, repo_root: PathBuf },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { .. } => Some(
        "Valid keys under [affected]: base, exclude_dev, exclude_optional, direct_only, root_triggers, exclude".to_string(),
      ),
      ConfigError::InvalidTrigger { .. } => {
        Some("Use a file name, a directory ending in '/', or a glob such as '*.cfg'.".to_string())
      }
      ConfigError::WorkspaceOutsideRepo { .. } => {
        Some("Run from inside the repository, or pass the changed files explicitly with --files.".to_string())
      }
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, message } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), message)
      }
      ConfigError::InvalidTrigger { pattern, reason } => {
        write!(f, "Invalid root trigger '{}': {}", pattern, reason)
      }
      ConfigError::WorkspaceOutsideRepo {
        workspace_root,
        repo_root,
      } => write!(
        f,
        "Workspace root {} is not inside the git repository at {}",
        workspace_root.display(),
        repo_root.display()
      ),
    }
  }
}

impl std::error::Error for ConfigError {}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Ref rejected before running git
  InvalidRef { reference: String, reason: String },

  /// Ref does not resolve
  UnknownRef { reference: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { .. } => Some("Run rail-affected from within a git repository.".to_string()),
      GitError::UnknownRef { .. } => Some(
        "Does the branch/ref exist? Try `git fetch` or pass a valid ref with --since. \
         If running in CI, check out with fetch-depth: 0."
          .to_string(),
      ),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::InvalidRef { reference, reason } => {
        write!(f, "Invalid git ref {:?}: {}", reference, reason)
      }
      GitError::UnknownRef { reference } => write!(f, "Could not resolve ref '{}'", reference),
    }
  }
}

impl std::error::Error for GitError {}

/// Result type alias for rail-affected
pub type RailResult<T> = Result<T, RailError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RailResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RailError>,
{
  fn context(self, ctx: impl Into<String>) -> RailResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Print an error to stderr with its help text
pub fn print_error(error: &RailError) {
  eprintln!("Error: {}", error);

  if let Some(help) = error.help_message() {
    eprintln!("Help: {}", help);
  }
}
