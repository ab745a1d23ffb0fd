//! Integration tests for `rail-affected affected`

use crate::helpers::{Member, TestWorkspace, affected_json, names, run_rail, run_rail_raw};
use anyhow::Result;

#[test]
fn test_shared_change_reaches_dependents() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.mark_base()?;

  ws.write("packages/shared/src/shared/__init__.py", "NAME = \"changed\"\n")?;
  ws.commit("Modify shared")?;

  let report = affected_json(&ws.path, &[])?;
  assert_eq!(names(&report, "directly_changed"), vec!["shared"]);
  assert_eq!(names(&report, "affected"), vec!["api", "shared", "worker"]);
  assert_eq!(report["test_all"], false);

  Ok(())
}

#[test]
fn test_no_changes() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.mark_base()?;

  let stdout = run_rail(&ws.path, &["affected", "--since", "origin/main"])?;
  assert_eq!(stdout, "No affected packages.\n");

  Ok(())
}

#[test]
fn test_root_trigger_affects_everything() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.mark_base()?;

  ws.write("uv.lock", &format!("{}\n", std::fs::read_to_string(ws.path.join("uv.lock"))?))?;
  ws.commit("Touch lock file")?;

  let report = affected_json(&ws.path, &[])?;
  assert_eq!(report["test_all"], true);
  assert!(names(&report, "directly_changed").is_empty());
  // Every package except the virtual root
  assert_eq!(
    names(&report, "affected"),
    vec!["api", "api-extra", "notify", "shared", "testkit", "worker"]
  );

  Ok(())
}

#[test]
fn test_github_dir_is_a_trigger() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.mark_base()?;

  ws.write(".github/workflows/ci.yml", "on: push\n")?;
  ws.commit("Add CI")?;

  let report = affected_json(&ws.path, &[])?;
  assert_eq!(report["test_all"], true);

  Ok(())
}

#[test]
fn test_direct_only() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.mark_base()?;

  ws.write("packages/shared/src/shared/util.py", "X = 1\n")?;
  ws.commit("Add util")?;

  let report = affected_json(&ws.path, &["--direct-only"])?;
  assert_eq!(names(&report, "affected"), vec!["shared"]);

  Ok(())
}

#[test]
fn test_longest_prefix_ownership() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.mark_base()?;

  ws.write("packages/api-extra/src/api_extra/foo.py", "X = 1\n")?;
  ws.commit("Touch api-extra")?;

  let report = affected_json(&ws.path, &[])?;
  assert_eq!(names(&report, "directly_changed"), vec!["api-extra"]);
  assert_eq!(names(&report, "affected"), vec!["api-extra"]);

  Ok(())
}

#[test]
fn test_unmatched_root_file_is_not_owned_by_virtual_root() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.mark_base()?;

  ws.write("README.md", "# Docs\n")?;
  ws.commit("Docs")?;

  let report = affected_json(&ws.path, &["--detailed"])?;
  assert!(names(&report, "affected").is_empty());
  assert_eq!(report["test_all"], false);
  assert!(report["file_mapping"]["README.md"].is_null());

  Ok(())
}

#[test]
fn test_dev_and_optional_filters() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.mark_base()?;

  ws.write("packages/testkit/src/testkit/fixtures.py", "X = 1\n")?;
  ws.write("packages/notify/src/notify/mail.py", "X = 1\n")?;
  ws.commit("Touch testkit and notify")?;

  let report = affected_json(&ws.path, &[])?;
  assert_eq!(names(&report, "affected"), vec!["api", "notify", "testkit", "worker"]);

  let report = affected_json(&ws.path, &["--no-dev"])?;
  assert_eq!(names(&report, "affected"), vec!["notify", "testkit", "worker"]);

  let report = affected_json(&ws.path, &["--no-dev", "--no-optional"])?;
  assert_eq!(names(&report, "affected"), vec!["notify", "testkit"]);

  Ok(())
}

#[test]
fn test_exclude_and_extra_trigger() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.mark_base()?;

  ws.write("packages/shared/src/shared/__init__.py", "NAME = \"changed\"\n")?;
  ws.commit("Modify shared")?;

  let report = affected_json(&ws.path, &["--exclude", "shared", "--exclude", "worker"])?;
  assert!(names(&report, "directly_changed").is_empty());
  assert_eq!(names(&report, "affected"), vec!["api"]);

  ws.write("Dockerfile", "FROM python:3.12\n")?;
  ws.commit("Add Dockerfile")?;

  let report = affected_json(&ws.path, &[])?;
  assert_eq!(report["test_all"], false);
  let report = affected_json(&ws.path, &["--root-trigger", "Dockerfile"])?;
  assert_eq!(report["test_all"], true);

  Ok(())
}

#[test]
fn test_ref_pair() -> Result<()> {
  let ws = TestWorkspace::new()?;

  ws.write("packages/worker/src/worker/job.py", "X = 1\n")?;
  let first = ws.commit("Worker job")?;
  ws.write("packages/api/src/api/routes.py", "X = 1\n")?;
  let second = ws.commit("Api routes")?;

  let report = affected_json(&ws.path, &["--from", &first, "--to", &second])?;
  assert_eq!(names(&report, "directly_changed"), vec!["api"]);

  Ok(())
}

#[test]
fn test_explicit_files_skip_git() -> Result<()> {
  let ws = TestWorkspace::new()?;
  std::fs::remove_dir_all(ws.repo.join(".git"))?;

  let report = affected_json(&ws.path, &["--files", "packages/shared/x.py", "./packages/api/y.py"])?;
  assert_eq!(names(&report, "directly_changed"), vec!["api", "shared"]);
  assert_eq!(names(&report, "affected"), vec!["api", "shared", "worker"]);

  Ok(())
}

#[test]
fn test_nested_workspace_rebases_paths() -> Result<()> {
  let members = vec![
    Member::new("core", "libs/core", &[]),
    Member::new("app", "apps/app", &["core"]),
  ];
  let ws = TestWorkspace::with_members("python", &members)?;
  ws.mark_base()?;

  ws.write("libs/core/src/core/__init__.py", "X = 2\n")?;
  // Same relative path but outside the workspace: must not map to `core`
  ws.write_in_repo("libs/core/notes.txt", "unrelated\n")?;
  ws.commit("Change core")?;

  let report = affected_json(&ws.path, &["--detailed"])?;
  assert_eq!(names(&report, "directly_changed"), vec!["core"]);
  assert_eq!(names(&report, "affected"), vec!["app", "core"]);
  let mapping = report["file_mapping"].as_object().unwrap();
  assert_eq!(mapping.len(), 1);
  assert_eq!(mapping["libs/core/src/core/__init__.py"], "core");

  // A root trigger of the nested workspace, seen from the repository root
  ws.write("uv.lock", &format!("{}\n", std::fs::read_to_string(ws.path.join("uv.lock"))?))?;
  ws.commit("Touch lock")?;
  let report = affected_json(&ws.repo, &["--manifest", "python/uv.lock"])?;
  assert_eq!(report["test_all"], true);

  Ok(())
}

#[test]
fn test_output_formats() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.mark_base()?;

  ws.write("packages/shared/src/shared/__init__.py", "NAME = \"changed\"\n")?;
  ws.commit("Modify shared")?;

  let text = run_rail(&ws.path, &["affected"])?;
  assert_eq!(
    text,
    "Affected packages (3):\n  - api (transitive)\n  - shared (direct)\n  - worker (transitive)\n"
  );

  let detailed = run_rail(&ws.path, &["affected", "--detailed"])?;
  assert!(detailed.starts_with("Changed files (1):\n  packages/shared/src/shared/__init__.py  -> shared\n\n"));

  let names_out = run_rail(&ws.path, &["affected", "--format", "names"])?;
  assert_eq!(names_out, "api\nshared\nworker\n");

  let paths = run_rail(&ws.path, &["affected", "--format", "paths"])?;
  assert_eq!(paths, "packages/api\npackages/shared\npackages/worker\n");

  let matrix = run_rail(&ws.path, &["affected", "--format", "matrix"])?;
  assert_eq!(matrix, "{\"package\":[\"api\",\"shared\",\"worker\"]}\n");

  Ok(())
}

#[test]
fn test_unknown_base_ref() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_rail_raw(&ws.path, &["affected", "--since", "does-not-exist"])?;
  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Could not resolve ref 'does-not-exist'"), "stderr: {}", stderr);
  assert!(stderr.contains("fetch-depth: 0"));
  assert!(output.stdout.is_empty());

  Ok(())
}

#[test]
fn test_invalid_ref_rejected_before_git() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_rail_raw(&ws.path, &["affected", "--since=--output=/tmp/x"])?;
  assert_eq!(output.status.code(), Some(2));
  assert!(String::from_utf8_lossy(&output.stderr).contains("must not start with '-'"));

  Ok(())
}

#[test]
fn test_outside_git_repository() -> Result<()> {
  let ws = TestWorkspace::new()?;
  std::fs::remove_dir_all(ws.repo.join(".git"))?;

  let output = run_rail_raw(&ws.path, &["affected"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Error:"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_malformed_lock_is_fatal() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("uv.lock", "version = 1\n[[package]]\nname = \"x\"\n")?;

  let output = run_rail_raw(&ws.path, &["affected", "--files", "x.py"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("has no [manifest] section"), "stderr: {}", stderr);
  assert!(stderr.contains("Help: Regenerate the lock file"));

  Ok(())
}
