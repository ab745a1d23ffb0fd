//! `rail-affected graph` - Inspect the workspace dependency graph
//!
//! Shows what the affected analysis would traverse: every package with its source
//! path, its (filtered) dependencies and dependents, plus any dependency cycles.

use crate::commands::affected::display_path;
use crate::core::config::AnalysisConfig;
use crate::core::context::WorkspaceContext;
use crate::core::error::{RailError, RailResult};
use crate::graph::DependencyGraph;
use crate::graph::workspace_graph::Dependency;
use serde::Serialize;
use std::collections::BTreeSet;

/// Output format for graph command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
  Text,
  Json,
  Dot,
}

impl GraphFormat {
  pub fn from_str(s: &str) -> RailResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "dot" | "graphviz" => Ok(Self::Dot),
      _ => Err(RailError::message(format!(
        "Unknown format '{}'. Valid formats: text, json, dot",
        s
      ))),
    }
  }
}

/// Run the graph command
pub fn run_graph(ctx: &WorkspaceContext, format: String, analysis: AnalysisConfig) -> RailResult<()> {
  let format = GraphFormat::from_str(&format)?;
  let analysis = ctx.analysis_config(&analysis);
  let graph = ctx.graph(&analysis)?;

  let output = match format {
    GraphFormat::Text => render_text(&graph, ctx.adapter.name()),
    GraphFormat::Json => render_json(&graph, &analysis)?,
    GraphFormat::Dot => graph.to_dot(),
  };
  print!("{}", output);

  Ok(())
}

fn render_text(graph: &DependencyGraph, ecosystem: &str) -> String {
  let mut out = format!("Workspace graph ({}, {} packages)\n", ecosystem, graph.packages().len());

  for pkg in graph.packages().values() {
    let location = if pkg.is_virtual_root {
      "(virtual root)".to_string()
    } else {
      display_path(&pkg.source_path).to_string()
    };
    out.push_str(&format!("\n{}  {}\n", pkg.name, location));
    out.push_str(&format!("  depends on: {}\n", join(graph.dependencies(&pkg.name))));
    out.push_str(&format!("  used by:    {}\n", join(graph.dependents(&pkg.name))));
  }

  let cycles = graph.cycles();
  if !cycles.is_empty() {
    out.push_str(&format!("\nCycles ({}):\n", cycles.len()));
    for cycle in &cycles {
      out.push_str(&format!("  {}\n", cycle.join(" <-> ")));
    }
  }

  out
}

fn join(names: Option<&BTreeSet<String>>) -> String {
  match names {
    Some(names) if !names.is_empty() => names.iter().map(String::as_str).collect::<Vec<_>>().join(", "),
    _ => "-".to_string(),
  }
}

#[derive(Serialize)]
struct PackageReport<'a> {
  name: &'a str,
  source_path: &'a str,
  virtual_root: bool,
  dependencies: Vec<&'a Dependency>,
  dependents: Vec<&'a str>,
}

#[derive(Serialize)]
struct GraphReport<'a> {
  packages: Vec<PackageReport<'a>>,
  cycles: Vec<Vec<String>>,
}

/// `dependencies` lists declarations whose kind survives `analysis`; a pair declared
/// both runtime and dev keeps only the runtime entry under `--no-dev`
fn render_json(graph: &DependencyGraph, analysis: &AnalysisConfig) -> RailResult<String> {
  let packages = graph
    .packages()
    .values()
    .map(|pkg| PackageReport {
      name: &pkg.name,
      source_path: &pkg.source_path,
      virtual_root: pkg.is_virtual_root,
      dependencies: pkg
        .dependencies
        .iter()
        .filter(|dep| analysis.includes(dep.kind))
        .collect(),
      dependents: graph
        .dependents(&pkg.name)
        .map(|set| set.iter().map(String::as_str).collect())
        .unwrap_or_default(),
    })
    .collect();

  let report = GraphReport {
    packages,
    cycles: graph.cycles(),
  };
  Ok(format!("{}\n", serde_json::to_string_pretty(&report)?))
}
