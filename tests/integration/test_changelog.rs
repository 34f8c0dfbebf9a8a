//! Integration tests for the changelog command

use crate::helpers::{TestRepo, run_packager_ok};
use anyhow::Result;

#[test]
fn test_changelog_from_metainfo() -> Result<()> {
  let repo = TestRepo::new()?;

  run_packager_ok(&repo.path, &["changelog"])?;

  let changelog = repo.read_file("CHANGELOG.md")?;
  assert!(changelog.starts_with("# Changelog\n"));
  assert!(changelog.contains("## [1.2.3] - 2025-06-01"));
  assert!(changelog.contains("### Added"));
  assert!(changelog.contains("- Unit file syntax highlighting"));
  assert!(changelog.contains("### Fixed"));

  Ok(())
}

#[test]
fn test_changelog_is_reproducible() -> Result<()> {
  let repo = TestRepo::new()?;

  run_packager_ok(&repo.path, &["changelog"])?;
  let first = repo.read_file("CHANGELOG.md")?;

  run_packager_ok(&repo.path, &["changelog"])?;
  let second = repo.read_file("CHANGELOG.md")?;

  assert_eq!(first, second);
  Ok(())
}

#[test]
fn test_changelog_runs_from_a_subdirectory() -> Result<()> {
  // All paths are anchored at the repository top level, not the cwd.
  let repo = TestRepo::new()?;

  run_packager_ok(&repo.path.join("data"), &["changelog"])?;

  assert!(repo.path.join("CHANGELOG.md").exists());
  Ok(())
}
