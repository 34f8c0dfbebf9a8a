//! Release identity: version, tag and commit
//!
//! The project's `Cargo.toml` is the single source of truth for the version.
//! It is re-read on every run (never cached across process invocations) so a
//! version bump is always reflected. The tag is the pure derivation
//! `"v" + version`; the commit exists only once the tag does.

pub mod changelog;

use crate::core::config::ReleaseConfig;
use crate::core::error::{PackError, PackResult};
use crate::core::git::Repo;
use crate::ui;
use std::path::Path;

/// Fields read from the project metadata file
#[derive(Debug, Clone)]
pub struct ProjectMetadata {
  pub version: String,
  pub description: String,
  pub author: String,
  pub repository: String,
}

impl ProjectMetadata {
  /// Load and validate metadata from a workspace `Cargo.toml`
  pub fn load(path: &Path) -> PackResult<Self> {
    let content = std::fs::read_to_string(path).map_err(|e| PackError::Metadata {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })?;
    Self::parse(&content).map_err(|reason| PackError::Metadata {
      path: path.to_path_buf(),
      reason,
    })
  }

  fn parse(content: &str) -> Result<Self, String> {
    let doc: toml_edit::DocumentMut = content.parse().map_err(|e| format!("{}", e))?;

    let package = doc
      .get("package")
      .and_then(|p| p.as_table())
      .ok_or("missing [package] section")?;

    let version = package
      .get("version")
      .and_then(|v| v.as_str())
      .ok_or("missing package.version")?
      .to_string();

    // The version must be semver-shaped; everything downstream (tag names,
    // artifact filenames, the Debian control file) assumes it.
    semver::Version::parse(&version).map_err(|e| format!("package.version '{}': {}", version, e))?;

    let description = package
      .get("description")
      .and_then(|v| v.as_str())
      .ok_or("missing package.description")?
      .to_string();

    let workspace_package = doc
      .get("workspace")
      .and_then(|w| w.as_table())
      .and_then(|w| w.get("package"))
      .and_then(|p| p.as_table_like())
      .ok_or("missing [workspace.package] section")?;

    let author = workspace_package
      .get("authors")
      .and_then(|a| a.as_array())
      .and_then(|a| a.iter().next())
      .and_then(|a| a.as_str())
      .ok_or("missing workspace.package.authors")?
      .to_string();

    let repository = workspace_package
      .get("repository")
      .and_then(|r| r.as_str())
      .ok_or("missing workspace.package.repository")?
      .to_string();

    Ok(Self {
      version,
      description,
      author,
      repository,
    })
  }
}

/// The derived release triple: version, tag, and (once tagged) commit
#[derive(Debug, Clone)]
pub struct ReleaseIdentity {
  pub version: String,
}

impl ReleaseIdentity {
  /// Read the identity from the configured metadata file
  pub fn load(cfg: &ReleaseConfig) -> PackResult<Self> {
    let metadata = ProjectMetadata::load(&cfg.cargo_toml())?;
    Ok(Self {
      version: metadata.version,
    })
  }

  /// The git tag for this release
  pub fn tag(&self) -> String {
    format!("v{}", self.version)
  }

  /// Resolve the tag to its commit; absent until the release is tagged
  pub fn resolve_commit(&self, repo: &Repo) -> PackResult<String> {
    repo.commit_for_tag(&self.tag())
  }
}

/// Create and push the release tag.
///
/// Mirrors the release ritual: gate on the dirty tree, commit a pending
/// `CHANGELOG.md` as a best-effort convenience, then tag and push as one
/// logical unit.
pub fn run_tag(
  cfg: &ReleaseConfig,
  force: bool,
  allow_dirty: bool,
  message: Option<String>,
) -> PackResult<()> {
  let repo = Repo::open(&cfg.workspace_root)?;
  repo.require_clean(allow_dirty)?;

  let identity = ReleaseIdentity::load(cfg)?;
  let tag = identity.tag();

  ui::step("Create the release tag and push it");
  println!("Program version {}", ui::detail(&identity.version));
  println!("Git tag {}", ui::detail(&tag));

  // A freshly generated changelog is the one change allowed past the gate;
  // commit it so the tag points at a tree that includes it.
  if repo.is_dirty()? {
    let code = repo.add("CHANGELOG.md")?;
    if code == 0 && repo.commit(&format!("change log {}", tag))? == 0 {
      repo.push_optional()?;
    }
  }

  let message = message.unwrap_or_else(|| format!("version {}", tag));
  repo.create_tag(&tag, &message, force, allow_dirty)?;

  println!("Tag {} created and pushed", ui::detail(&tag));
  Ok(())
}
