//! Integration tests for tag resolution and manifest pinning

use crate::helpers::{APP_ID, TestRepo, git, run_packager, run_packager_ok};
use anyhow::Result;

#[test]
fn test_aur_generate_requires_the_release_tag() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_aur_template()?;

  let output = run_packager(&repo.path, &["aur", "generate"])?;

  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("v1.2.3"));
  assert!(!repo.aur_dir().join("PKGBUILD").exists());

  Ok(())
}

#[test]
fn test_aur_generate_fills_the_template() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_aur_template()?;
  repo.add_remote()?;
  run_packager_ok(&repo.path, &["tag"])?;

  run_packager_ok(&repo.path, &["aur", "generate"])?;

  let head = git(&repo.path, &["rev-parse", "v1.2.3^{commit}"])?;
  let commit = String::from_utf8_lossy(&head.stdout).trim().to_string();

  let pkgbuild = std::fs::read_to_string(repo.aur_dir().join("PKGBUILD"))?;
  assert!(pkgbuild.contains("pkgver=1.2.3\n"));
  assert!(pkgbuild.contains(&format!("_commit={}\n", commit)));
  assert!(repo.aur_dir().join("sysd-manager.install").exists());
  assert!(repo.aur_dir().join("CHANGELOG.md").exists());

  Ok(())
}

#[test]
fn test_manifest_pin_requires_the_release_tag() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_manifest()?;

  let output = run_packager(&repo.path, &["flathub", "manifest", "--from-git"])?;

  assert!(!output.status.success());
  // nothing was written: a half-pinned manifest must never exist on disk
  assert!(!repo.flatpak_build_dir().join(format!("{}.yaml", APP_ID)).exists());

  Ok(())
}

#[test]
fn test_manifest_pin_embeds_tag_and_commit() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_manifest()?;
  repo.add_remote()?;
  run_packager_ok(&repo.path, &["tag"])?;

  run_packager_ok(&repo.path, &["flathub", "manifest", "--from-git"])?;

  let head = git(&repo.path, &["rev-parse", "v1.2.3^{commit}"])?;
  let commit = String::from_utf8_lossy(&head.stdout).trim().to_string();

  let manifest = std::fs::read_to_string(repo.flatpak_build_dir().join(format!("{}.yaml", APP_ID)))?;
  assert!(manifest.contains("type: git"));
  assert!(manifest.contains("tag: v1.2.3"));
  assert!(manifest.contains(&format!("commit: {}", commit)));

  Ok(())
}

#[test]
fn test_unpinned_manifest_keeps_the_local_source() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_manifest()?;

  run_packager_ok(&repo.path, &["flathub", "manifest"])?;

  let manifest = std::fs::read_to_string(repo.flatpak_build_dir().join(format!("{}.yaml", APP_ID)))?;
  assert!(manifest.contains("type: dir"));
  assert!(!manifest.contains("type: git"));

  Ok(())
}
