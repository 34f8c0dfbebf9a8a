//! System git backend
//!
//! All version-control operations go through the system `git` binary, run
//! from the repository root. Two invariants live here:
//!
//! - the dirty-tree gate: nothing is tagged or published from a working tree
//!   with uncommitted or untracked changes (reserved exit code 101), and
//! - tag creation and its push are one logical unit; a created-but-unpushed
//!   tag is reported as an explicit inconsistency, not silently left behind.

use crate::core::error::{PackError, PackResult};
use crate::core::runner::{Exec, Invocation};
use std::path::{Path, PathBuf};
use std::process::Command;

/// A git working tree, opened at its top level
pub struct Repo {
  root: PathBuf,
}

impl Repo {
  /// Open the repository containing `path`
  pub fn open(path: &Path) -> PackResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .map_err(|source| PackError::Spawn {
        command: "git rev-parse --show-toplevel".to_string(),
        source,
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(PackError::message(format!(
        "Failed to open git repository at {}: {}",
        path.display(),
        stderr.trim()
      )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(Self {
      root: PathBuf::from(stdout.trim()),
    })
  }

  /// Repository top-level directory
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn git(&self, args: &[&str]) -> Exec {
    let mut argv = vec!["git".to_string()];
    argv.extend(args.iter().map(|s| s.to_string()));
    Exec::new(Invocation::Argv(argv)).cwd(&self.root)
  }

  /// Report whether the working tree has uncommitted or untracked changes
  pub fn is_dirty(&self) -> PackResult<bool> {
    let out = self.git(&["status", "--porcelain"]).quiet().run_capture()?;
    Ok(!out.trim().is_empty())
  }

  /// The dirty-tree gate: refuse to proceed unless the tree is clean or the
  /// operator explicitly overrode the check.
  pub fn require_clean(&self, allow_dirty: bool) -> PackResult<()> {
    if allow_dirty {
      return Ok(());
    }
    if self.is_dirty()? {
      return Err(PackError::DirtyTree);
    }
    Ok(())
  }

  /// Resolve a tag to its commit hash.
  ///
  /// A tag that does not exist is [`PackError::TagNotFound`], never an empty
  /// string; callers embedding the commit in a manifest rely on this.
  pub fn commit_for_tag(&self, tag: &str) -> PackResult<String> {
    let spec = format!("{}^{{commit}}", tag);
    let output = Command::new("git")
      .arg("-C")
      .arg(&self.root)
      .args(["rev-parse", "--verify", "--quiet", &spec])
      .output()
      .map_err(|source| PackError::Spawn {
        command: format!("git rev-parse --verify {}", spec),
        source,
      })?;

    if !output.status.success() {
      return Err(PackError::TagNotFound { tag: tag.to_string() });
    }

    let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !is_valid_sha(&commit) {
      return Err(PackError::TagNotFound { tag: tag.to_string() });
    }

    Ok(commit)
  }

  /// Create an annotated tag and push it, as one logical unit.
  ///
  /// The gate runs first. If the push fails after the tag was created, the
  /// error names the tag so the operator can resolve the local/remote
  /// mismatch instead of discovering it at the next release.
  pub fn create_tag(&self, tag: &str, message: &str, force: bool, allow_dirty: bool) -> PackResult<()> {
    self.require_clean(allow_dirty)?;

    let mut tag_args = vec!["tag", "-m", message, tag];
    let mut push_args = vec!["push", "origin", "tag", tag];
    if force {
      tag_args.insert(1, "-f");
      push_args.insert(1, "-f");
    }

    self.git(&tag_args).run_required()?;

    if let Err(err) = self.git(&push_args).run_required() {
      return Err(PackError::TagUnpushed {
        tag: tag.to_string(),
        reason: err.to_string(),
      });
    }

    Ok(())
  }

  /// Best-effort `git add` of a single file; returns the exit code
  pub fn add(&self, file: &str) -> PackResult<i32> {
    self.git(&["add", file]).run_optional()
  }

  /// Best-effort commit of everything staged; returns the exit code
  pub fn commit(&self, message: &str) -> PackResult<i32> {
    self.git(&["commit", "-m", message]).run_optional()
  }

  /// Best-effort commit of all tracked changes; returns the exit code
  pub fn commit_all(&self, message: &str) -> PackResult<i32> {
    self.git(&["commit", "-a", "-m", message]).run_optional()
  }

  /// Push the current branch; required
  pub fn push(&self) -> PackResult<()> {
    self.git(&["push"]).run_required()
  }

  /// Best-effort push of the current branch; returns the exit code
  pub fn push_optional(&self) -> PackResult<i32> {
    self.git(&["push"]).run_optional()
  }

  /// Best-effort `git pull` with rebase configured first; used before
  /// deploying to a shared fork checkout
  pub fn pull_rebase(&self) -> PackResult<i32> {
    self.git(&["config", "pull.rebase", "true"]).run_optional()?;
    self.git(&["pull"]).run_optional()
  }
}

/// Validate SHA format (40 hex chars)
fn is_valid_sha(sha: &str) -> bool {
  sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit())
}
