//! Integration tests for the tag command

use crate::helpers::{TestRepo, git, run_packager, run_packager_ok};
use anyhow::Result;

#[test]
fn test_tag_creates_and_pushes_v_prefixed_tag() -> Result<()> {
  let repo = TestRepo::new()?;
  let remote = repo.add_remote()?;

  run_packager_ok(&repo.path, &["tag"])?;

  let local = git(&repo.path, &["tag", "-l", "v1.2.3"])?;
  assert_eq!(String::from_utf8_lossy(&local.stdout).trim(), "v1.2.3");

  // the push is part of the operation, not a separate step
  let pushed = git(&remote, &["tag", "-l", "v1.2.3"])?;
  assert_eq!(String::from_utf8_lossy(&pushed.stdout).trim(), "v1.2.3");

  Ok(())
}

#[test]
fn test_tag_commits_a_pending_changelog_first() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_remote()?;

  run_packager_ok(&repo.path, &["changelog"])?;
  run_packager_ok(&repo.path, &["tag", "--allow-dirty"])?;

  // the tag points at a tree that includes the generated changelog
  let tree = git(&repo.path, &["ls-tree", "--name-only", "v1.2.3"])?;
  assert!(String::from_utf8_lossy(&tree.stdout).contains("CHANGELOG.md"));

  Ok(())
}

#[test]
fn test_tag_push_failure_reports_the_local_tag() -> Result<()> {
  // no remote configured, so the push after tag creation fails
  let repo = TestRepo::new()?;

  let output = run_packager(&repo.path, &["tag"])?;
  assert!(!output.status.success());

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(
    stderr.contains("created locally but could not be pushed"),
    "stderr: {}",
    stderr
  );

  // the local tag survives so the operator can push or delete it by hand
  let local = git(&repo.path, &["tag", "-l", "v1.2.3"])?;
  assert_eq!(String::from_utf8_lossy(&local.stdout).trim(), "v1.2.3");

  Ok(())
}

#[test]
fn test_tag_force_replaces_an_existing_tag() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_remote()?;

  run_packager_ok(&repo.path, &["tag"])?;
  let first = git(&repo.path, &["rev-parse", "v1.2.3"])?;

  git(&repo.path, &["commit", "--allow-empty", "-m", "Another change"])?;

  // without --force the tag already exists
  let output = run_packager(&repo.path, &["tag"])?;
  assert!(!output.status.success());

  run_packager_ok(&repo.path, &["tag", "--force"])?;
  let second = git(&repo.path, &["rev-parse", "v1.2.3"])?;
  assert_ne!(first.stdout, second.stdout);

  Ok(())
}
