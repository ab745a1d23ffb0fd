mod commands;
mod core;
mod graph;
mod manifest;

use clap::{Parser, Subcommand};
use crate::core::config::AnalysisConfig;
use crate::core::context::WorkspaceContext;
use crate::core::error::{RailError, print_error};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Find the workspace packages affected by a git diff
#[derive(Parser)]
#[command(name = "rail-affected")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Log to stderr (-v debug, -vv trace; RUST_LOG overrides)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  /// Workspace manifest (uv.lock or Cargo.toml) or workspace directory
  #[arg(long, value_name = "PATH", global = true)]
  manifest: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show packages affected by changes since a git ref
  Affected {
    /// Git ref to compare against (default: [affected] base, then origin/main)
    #[arg(long, value_name = "REF", conflicts_with_all = ["from", "to"])]
    since: Option<String>,
    /// Start of an explicit range (use with --to)
    #[arg(long, value_name = "REF", requires = "to")]
    from: Option<String>,
    /// End of an explicit range (use with --from)
    #[arg(long, value_name = "REF", requires = "from")]
    to: Option<String>,
    /// Workspace-relative changed files; skips git
    #[arg(long, value_name = "PATH", num_args = 1.., conflicts_with_all = ["since", "from", "to"])]
    files: Vec<String>,
    /// Output format: text, json, names, paths, matrix
    #[arg(short, long, default_value = "text")]
    format: String,
    /// Show each changed file and the package it maps to
    #[arg(long)]
    detailed: bool,
    /// Exclude dev dependencies from the dependency graph
    #[arg(long)]
    no_dev: bool,
    /// Exclude optional dependencies from the dependency graph
    #[arg(long)]
    no_optional: bool,
    /// Only report directly changed packages, skip dependents
    #[arg(long)]
    direct_only: bool,
    /// Extra file/dir/glob that triggers testing everything (dirs end in '/')
    #[arg(long = "root-trigger", value_name = "PATTERN")]
    root_triggers: Vec<String>,
    /// Exclude a package from the result (repeatable)
    #[arg(long, value_name = "PACKAGE")]
    exclude: Vec<String>,
  },

  /// Show the workspace dependency graph
  Graph {
    /// Output format: text, json, dot
    #[arg(short, long, default_value = "text")]
    format: String,
    /// Exclude dev dependencies from the dependency graph
    #[arg(long)]
    no_dev: bool,
    /// Exclude optional dependencies from the dependency graph
    #[arg(long)]
    no_optional: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing(verbose: u8) {
  let level = match verbose {
    0 => "warn",
    1 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  let subscriber = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_level(true)
    .finish();

  let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let cwd = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(RailError::message(format!("Failed to get current directory: {}", e))),
  };

  // Load manifest + rail.toml once; every command shares it
  let ctx = match WorkspaceContext::build(&cwd, cli.manifest.as_deref()) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };
  debug!(
    "Loaded {} ({} packages)",
    ctx.manifest_path.display(),
    ctx.manifest.packages.len()
  );

  let result = match cli.command {
    Commands::Affected {
      since,
      from,
      to,
      files,
      format,
      detailed,
      no_dev,
      no_optional,
      direct_only,
      root_triggers,
      exclude,
    } => commands::run_affected(
      &ctx,
      commands::AffectedOptions {
        since,
        from,
        to,
        files,
        format,
        detailed,
        analysis: AnalysisConfig {
          exclude_dev: no_dev,
          exclude_optional: no_optional,
          root_triggers: root_triggers.into_iter().collect(),
          exclude_packages: exclude.into_iter().collect(),
          direct_only,
        },
      },
    ),
    Commands::Graph {
      format,
      no_dev,
      no_optional,
    } => commands::run_graph(
      &ctx,
      format,
      AnalysisConfig {
        exclude_dev: no_dev,
        exclude_optional: no_optional,
        ..Default::default()
      },
    ),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: RailError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
