//! `rail-affected affected` - Show which packages are affected by changes
//!
//! This command collects changed files (via git, or `--files`) and determines:
//! - Which workspace packages directly contain changed files
//! - Which packages transitively depend on those changed packages
//! - Whether a root trigger fired and everything needs testing

use crate::core::config::AnalysisConfig;
use crate::core::context::WorkspaceContext;
use crate::core::error::{ConfigError, RailError, RailResult};
use crate::core::vcs::SystemGit;
use crate::graph::{AffectedResult, DependencyGraph, WorkspacePrefix, assemble};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Base ref used when neither `--since` nor `[affected] base` is set
pub const DEFAULT_BASE: &str = "origin/main";

/// Output format for affected command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  Text,
  Json,
  Names,
  Paths,
  Matrix,
}

impl OutputFormat {
  pub fn from_str(s: &str) -> RailResult<Self> {
    match s.to_lowercase().as_str() {
      "text" | "human" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::Names),
      "paths" => Ok(Self::Paths),
      "matrix" => Ok(Self::Matrix),
      _ => Err(RailError::message(format!(
        "Unknown format '{}'. Valid formats: text, json, names, paths, matrix",
        s
      ))),
    }
  }
}

/// Where the changed files come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSource {
  /// `git diff <base>...HEAD`
  Since(String),
  /// `git diff <from> <to>`
  Between { from: String, to: String },
  /// Explicit workspace-relative paths; git is not consulted
  Files(Vec<String>),
}

/// Options for one `affected` run
#[derive(Debug, Clone)]
pub struct AffectedOptions {
  pub since: Option<String>,
  pub from: Option<String>,
  pub to: Option<String>,
  pub files: Vec<String>,
  pub format: String,
  pub detailed: bool,
  /// Command-line analysis options, merged over rail.toml
  pub analysis: AnalysisConfig,
}

impl AffectedOptions {
  /// Pick the change source: explicit files, then a ref pair, then `--since`,
  /// then the configured base, then `origin/main`
  pub fn change_source(&self, configured_base: Option<&str>) -> RailResult<ChangeSource> {
    if !self.files.is_empty() {
      return Ok(ChangeSource::Files(self.files.clone()));
    }

    match (&self.from, &self.to) {
      (Some(from), Some(to)) => {
        return Ok(ChangeSource::Between {
          from: from.clone(),
          to: to.clone(),
        });
      }
      (None, None) => {}
      _ => return Err(RailError::message("--from and --to must be given together")),
    }

    let base = self
      .since
      .as_deref()
      .or(configured_base)
      .unwrap_or(DEFAULT_BASE)
      .to_string();
    Ok(ChangeSource::Since(base))
  }
}

/// Run the affected command
pub fn run_affected(ctx: &WorkspaceContext, options: AffectedOptions) -> RailResult<()> {
  let output_format = OutputFormat::from_str(&options.format)?;
  let analysis = ctx.analysis_config(&options.analysis);

  let graph = ctx.graph(&analysis)?;
  let triggers = ctx.root_triggers(&analysis)?;

  let source = options.change_source(ctx.config.affected.base.as_deref())?;
  let changed_files = collect_changed_files(ctx, &source)?;

  let result = assemble(changed_files.as_slice(), &graph, &triggers, &analysis)?;
  for file in result.unmatched() {
    debug!("{} is outside every package{}", file.path, if file.trigger { " (root trigger)" } else { "" });
  }
  if result.is_empty() {
    debug!("Nothing affected by {} changed file(s)", result.files.len());
  }

  let output = render(&result, &graph, output_format, options.detailed)?;
  print!("{}", output);

  Ok(())
}

/// Workspace-relative changed files for a change source
fn collect_changed_files(ctx: &WorkspaceContext, source: &ChangeSource) -> RailResult<Vec<String>> {
  let (git, files) = match source {
    ChangeSource::Files(files) => {
      debug!("Using {} files from the command line", files.len());
      return Ok(WorkspacePrefix::root().rebase_all(files.as_slice()));
    }
    ChangeSource::Since(base) => {
      let git = SystemGit::open(ctx.workspace_root())?;
      let files = git.changed_files_since(base)?;
      (git, files)
    }
    ChangeSource::Between { from, to } => {
      let git = SystemGit::open(ctx.workspace_root())?;
      let files = git.changed_files_between(from, to)?;
      (git, files)
    }
  };

  let prefix =
    WorkspacePrefix::between(git.work_tree(), ctx.workspace_root()).ok_or_else(|| ConfigError::WorkspaceOutsideRepo {
      workspace_root: ctx.workspace_root().to_path_buf(),
      repo_root: git.work_tree().to_path_buf(),
    })?;

  if !prefix.as_str().is_empty() {
    debug!("Workspace lives at '{}' inside the repository", prefix.as_str());
  }

  Ok(prefix.rebase_all(files.as_slice()))
}

/// A root crate's empty source path prints as "."
pub fn display_path(source_path: &str) -> &str {
  if source_path.is_empty() { "." } else { source_path }
}

/// Render a result in the requested format
pub fn render(result: &AffectedResult, graph: &DependencyGraph, format: OutputFormat, detailed: bool) -> RailResult<String> {
  match format {
    OutputFormat::Text => Ok(render_text(result, detailed)),
    OutputFormat::Json => render_json(result, detailed),
    OutputFormat::Names => Ok(lines(result.affected.iter().map(String::as_str))),
    OutputFormat::Paths => Ok(lines(
      result
        .affected
        .iter()
        .filter_map(|name| graph.package(name))
        .map(|pkg| display_path(&pkg.source_path)),
    )),
    OutputFormat::Matrix => render_matrix(result),
  }
}

fn lines<'a>(items: impl Iterator<Item = &'a str>) -> String {
  items.map(|item| format!("{}\n", item)).collect()
}

/// Human-readable report
fn render_text(result: &AffectedResult, detailed: bool) -> String {
  let mut out = String::new();

  if result.test_all {
    out.push_str("Root trigger changed: testing all packages\n\n");
  }

  if detailed {
    out.push_str(&format!("Changed files ({}):\n", result.files.len()));
    for file in &result.files {
      let label = file.owner.as_deref().unwrap_or("(root/unmatched)");
      out.push_str(&format!("  {}  -> {}\n", file.path, label));
    }
    out.push('\n');
  }

  if result.affected.is_empty() {
    out.push_str("No affected packages.\n");
    return out;
  }

  out.push_str(&format!("Affected packages ({}):\n", result.affected.len()));
  for name in &result.affected {
    let marker = if result.is_transitive(name) {
      "transitive"
    } else {
      "direct"
    };
    out.push_str(&format!("  - {} ({})\n", name, marker));
  }

  out
}

#[derive(Serialize)]
struct AffectedReport<'a> {
  directly_changed: &'a BTreeSet<String>,
  affected: &'a BTreeSet<String>,
  test_all: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  file_mapping: Option<BTreeMap<&'a str, Option<&'a str>>>,
}

fn render_json(result: &AffectedResult, detailed: bool) -> RailResult<String> {
  let report = AffectedReport {
    directly_changed: &result.directly_changed,
    affected: &result.affected,
    test_all: result.test_all,
    file_mapping: detailed.then(|| {
      result
        .files
        .iter()
        .map(|f| (f.path.as_str(), f.owner.as_deref()))
        .collect()
    }),
  };
  Ok(format!("{}\n", serde_json::to_string_pretty(&report)?))
}

/// CI build-matrix encoding, single line so it can go straight into `$GITHUB_OUTPUT`
fn render_matrix(result: &AffectedResult) -> RailResult<String> {
  let matrix = serde_json::json!({ "package": result.affected });
  Ok(format!("{}\n", serde_json::to_string(&matrix)?))
}
