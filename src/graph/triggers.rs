//! Root triggers: changes that affect the whole workspace
//!
//! Three pattern shapes:
//! - `uv.lock`: exact workspace-relative file
//! - `.github/`: everything under a directory
//! - `requirements/*.txt`: glob, matched with the `glob` crate

use super::paths::{is_path_prefix, normalize_path};
use crate::core::error::ConfigError;
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;

/// Compiled trigger set (defaults plus caller additions)
#[derive(Debug, Clone, Default)]
pub struct RootTriggers {
  files: BTreeSet<String>,
  dirs: BTreeSet<String>,
  globs: Vec<Pattern>,
  patterns: BTreeSet<String>,
}

impl RootTriggers {
  /// Compile the ecosystem defaults together with extra patterns.
  ///
  /// Extra patterns never replace defaults.
  pub fn new<I, S>(defaults: &[&str], extra: I) -> Result<Self, ConfigError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut triggers = Self::default();
    for pattern in defaults {
      triggers.add(pattern)?;
    }
    for pattern in extra {
      triggers.add(pattern.as_ref())?;
    }
    Ok(triggers)
  }

  fn add(&mut self, raw: &str) -> Result<(), ConfigError> {
    let trimmed = raw.trim();
    let normalized = normalize_path(trimmed);
    if normalized.is_empty() {
      return Err(ConfigError::InvalidTrigger {
        pattern: raw.to_string(),
        reason: "pattern is empty or names the workspace root".to_string(),
      });
    }

    if trimmed.ends_with('/') {
      self.dirs.insert(normalized.clone());
      self.patterns.insert(format!("{}/", normalized));
    } else if trimmed.contains(['*', '?', '[']) {
      // Separator rewriting would corrupt a backslash inside a glob
      let glob = trimmed.trim_start_matches("./");
      let compiled = Pattern::new(glob).map_err(|e| ConfigError::InvalidTrigger {
        pattern: raw.to_string(),
        reason: e.msg.to_string(),
      })?;
      self.globs.push(compiled);
      self.patterns.insert(glob.to_string());
    } else {
      self.files.insert(normalized.clone());
      self.patterns.insert(normalized);
    }
    Ok(())
  }

  /// Whether a normalized, workspace-relative path is a global trigger
  pub fn matches(&self, path: &str) -> bool {
    if self.files.contains(path) {
      return true;
    }
    if self.dirs.iter().any(|dir| is_path_prefix(dir, path)) {
      return true;
    }

    let options = MatchOptions {
      case_sensitive: true,
      require_literal_separator: true,
      require_literal_leading_dot: false,
    };
    self.globs.iter().any(|g| g.matches_with(path, options))
  }

  /// All configured patterns, sorted (directories keep their trailing `/`)
  pub fn patterns(&self) -> impl Iterator<Item = &str> {
    self.patterns.iter().map(String::as_str)
  }
}
