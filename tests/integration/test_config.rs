//! Integration tests for rail.toml handling

use crate::helpers::{TestWorkspace, affected_json, git, names, run_rail_raw};
use anyhow::Result;

#[test]
fn test_configured_base_ref() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("rail.toml", "[affected]\nbase = \"develop\"\n")?;
  ws.commit("Add rail.toml")?;
  git(&ws.repo, &["branch", "develop"])?;

  ws.write("packages/worker/src/worker/job.py", "X = 1\n")?;
  ws.commit("Worker job")?;

  // No origin/main exists: the configured base must be used
  let report = affected_json(&ws.path, &[])?;
  assert_eq!(names(&report, "directly_changed"), vec!["worker"]);

  Ok(())
}

#[test]
fn test_configured_filters_and_triggers() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write(
    "rail.toml",
    "[affected]\nexclude_dev = true\nexclude = [\"notify\"]\nroot_triggers = [\"scripts/\"]\n",
  )?;
  ws.commit("Add rail.toml")?;
  ws.mark_base()?;

  ws.write("packages/testkit/src/testkit/fixtures.py", "X = 1\n")?;
  ws.write("packages/notify/src/notify/mail.py", "X = 1\n")?;
  ws.commit("Touch testkit and notify")?;

  let report = affected_json(&ws.path, &[])?;
  assert_eq!(names(&report, "affected"), vec!["testkit", "worker"]);

  ws.write("scripts/release.sh", "echo\n")?;
  ws.commit("Add script")?;
  let report = affected_json(&ws.path, &[])?;
  assert_eq!(report["test_all"], true);

  Ok(())
}

#[test]
fn test_config_in_dot_config_dir() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write(".config/rail.toml", "[affected]\ndirect_only = true\n")?;
  ws.commit("Add config")?;
  ws.mark_base()?;

  ws.write("packages/shared/src/shared/__init__.py", "NAME = \"changed\"\n")?;
  ws.commit("Modify shared")?;

  let report = affected_json(&ws.path, &[])?;
  assert_eq!(names(&report, "affected"), vec!["shared"]);

  Ok(())
}

#[test]
fn test_unknown_config_key() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("rail.toml", "[affected]\nexclude_tests = true\n")?;

  let output = run_rail_raw(&ws.path, &["affected", "--files", "x.py"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Invalid configuration"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_invalid_trigger_pattern() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_rail_raw(&ws.path, &["affected", "--files", "x.py", "--root-trigger", "[oops"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Invalid root trigger '[oops'"), "stderr: {}", stderr);
  assert!(stderr.contains("Help:"));

  Ok(())
}
