//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const APP_ID: &str = "io.github.plrigaux.sysd-manager";

const CARGO_TOML: &str = r#"[package]
name = "sysd-manager"
version = "1.2.3"
description = "A GUI to manage systemd units"

[workspace]

[workspace.package]
authors = ["Test Author <test@example.com>"]
repository = "https://github.com/plrigaux/sysd-manager"
"#;

const METAINFO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<component type="desktop-application">
  <id>io.github.plrigaux.sysd-manager</id>
  <releases>
    <release version="1.2.3" date="2025-06-01">
      <description>
        <p>Added</p>
        <ul>
          <li>Unit file syntax highlighting</li>
        </ul>
        <p>Fixed</p>
        <ul>
          <li>Crash when a unit vanishes mid-refresh</li>
        </ul>
      </description>
    </release>
  </releases>
</component>
"#;

/// An application checkout fixture with git history.
///
/// The checkout lives in a subdirectory of the tempdir so the staging
/// directories the packager creates next to it stay inside the fixture.
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestRepo {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("sysd-manager");
    std::fs::create_dir_all(&path)?;

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(path.join("Cargo.toml"), CARGO_TOML)?;

    let metainfo_dir = path.join("data").join("metainfo");
    std::fs::create_dir_all(&metainfo_dir)?;
    std::fs::write(metainfo_dir.join(format!("{}.metainfo.xml", APP_ID)), METAINFO)?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial checkout"])?;

    Ok(Self { _root: root, path })
  }

  /// Add a bare repository as `origin` so pushes have somewhere to go
  pub fn add_remote(&self) -> Result<PathBuf> {
    let remote = self.path.parent().unwrap().join("origin.git");
    git(remote.parent().unwrap(), &["init", "--bare", "origin.git"])?;
    git(&self.path, &["remote", "add", "origin", remote.to_str().unwrap()])?;
    git(&self.path, &["push", "-u", "origin", "main"])?;
    Ok(remote)
  }

  /// Drop the PKGBUILD template into the checkout
  pub fn add_aur_template(&self) -> Result<()> {
    let template_dir = self.path.join("packaging").join("aur");
    std::fs::create_dir_all(&template_dir)?;
    std::fs::write(
      template_dir.join("PKGBUILD"),
      "pkgname=sysd-manager\npkgver=\npkgrel=1\n_commit=\nsha256sums=()\n",
    )?;
    std::fs::write(template_dir.join("sysd-manager.install"), "post_install() { :; }\n")?;
    std::fs::write(self.path.join("CHANGELOG.md"), "# Changelog\n")?;
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", "Add AUR template"])?;
    Ok(())
  }

  /// Drop the canonical Flatpak manifest into the checkout
  pub fn add_manifest(&self) -> Result<()> {
    let manifest_dir = self.path.join("packaging").join("flathub");
    std::fs::create_dir_all(&manifest_dir)?;
    std::fs::write(
      manifest_dir.join(format!("{}.yaml", APP_ID)),
      "app-id: io.github.plrigaux.sysd-manager\nmodules:\n  - name: sysd-manager\n    sources:\n      - type: dir\n        path: .\n",
    )?;
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", "Add Flatpak manifest"])?;
    Ok(())
  }

  /// The AUR output checkout next to the fixture
  pub fn aur_dir(&self) -> PathBuf {
    self.path.parent().unwrap().join("aur").join("sysd-manager")
  }

  /// The Flatpak scratch build directory next to the fixture
  pub fn flatpak_build_dir(&self) -> PathBuf {
    self.path.parent().unwrap().join("flatpak_sysdm")
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    std::fs::read_to_string(self.path.join(path)).context(path.to_string())
  }
}

/// Run a git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the packager binary; the caller inspects the exit status
pub fn run_packager(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_sysd-packager");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run sysd-packager")
}

/// Run the packager binary and fail the test on a non-zero exit
pub fn run_packager_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_packager(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "sysd-packager {} failed\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}
