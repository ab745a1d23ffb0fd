use crate::core::error::{ConfigError, RailResult, ResultExt};
use crate::manifest::DependencyKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Caller policy for one analysis run.
///
/// Handed explicitly to the graph builder (edge filtering) and to the assembler
/// (exclusions, direct-only). Never read from global state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
  /// Drop dev-dependency edges when building the graph
  pub exclude_dev: bool,
  /// Drop optional-dependency edges when building the graph
  pub exclude_optional: bool,
  /// Extra root trigger patterns, added to the ecosystem defaults
  pub root_triggers: BTreeSet<String>,
  /// Packages removed from the final result
  pub exclude_packages: BTreeSet<String>,
  /// Skip the reverse-dependency closure
  pub direct_only: bool,
}

impl AnalysisConfig {
  /// Whether edges of this kind survive graph construction
  pub fn includes(&self, kind: DependencyKind) -> bool {
    match kind {
      DependencyKind::Runtime => true,
      DependencyKind::Dev => !self.exclude_dev,
      DependencyKind::Optional => !self.exclude_optional,
    }
  }

  /// Seed an analysis config from the `[affected]` section of rail.toml
  pub fn from_section(section: &AffectedSection) -> Self {
    Self {
      exclude_dev: section.exclude_dev,
      exclude_optional: section.exclude_optional,
      root_triggers: section.root_triggers.iter().cloned().collect(),
      exclude_packages: section.exclude.iter().cloned().collect(),
      direct_only: section.direct_only,
    }
  }

  /// Layer command-line options on top: flags are OR-ed, lists are unioned
  pub fn merge(mut self, cli: &AnalysisConfig) -> Self {
    self.exclude_dev |= cli.exclude_dev;
    self.exclude_optional |= cli.exclude_optional;
    self.direct_only |= cli.direct_only;
    self.root_triggers.extend(cli.root_triggers.iter().cloned());
    self.exclude_packages.extend(cli.exclude_packages.iter().cloned());
    self
  }
}

/// Configuration file for rail-affected
/// Searched in order: rail.toml, .rail.toml, .cargo/rail.toml, .config/rail.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RailConfig {
  #[serde(default)]
  pub affected: AffectedSection,
}

/// `[affected]` table
///
/// # Example
///
/// ```toml
/// [affected]
/// base = "origin/develop"
/// exclude_dev = true
/// root_triggers = ["Dockerfile", "docker/"]
/// exclude = ["docs-site"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AffectedSection {
  /// Base ref to diff against when --since is not given
  pub base: Option<String>,
  pub exclude_dev: bool,
  pub exclude_optional: bool,
  pub direct_only: bool,
  pub root_triggers: Vec<String>,
  pub exclude: Vec<String>,
}

impl RailConfig {
  /// Find config file in search order: rail.toml, .rail.toml, .cargo/rail.toml, .config/rail.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("rail.toml"),
      path.join(".rail.toml"),
      path.join(".cargo").join("rail.toml"),
      path.join(".config").join("rail.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config if one exists; a workspace without one gets the defaults
  pub fn load(path: &Path) -> RailResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

    Self::parse(&content, &config_path)
  }

  /// Parse config contents; `config_path` is used for messages only
  pub fn parse(content: &str, config_path: &Path) -> RailResult<Self> {
    let config: RailConfig = toml_edit::de::from_str(content).map_err(|e| ConfigError::Invalid {
      path: config_path.to_path_buf(),
      message: e.to_string().trim().to_string(),
    })?;
    Ok(config)
  }
}
