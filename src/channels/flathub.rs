//! Flathub channel
//!
//! Drives local Flatpak builds in a scratch directory next to the checkout
//! and deployments to the Flathub fork checkout. The manifest that leaves
//! this machine is always pinned: deployment resolves the release tag to its
//! commit and refuses to proceed when the tag does not exist yet.

use crate::bundle;
use crate::core::config::ReleaseConfig;
use crate::core::error::{PackError, PackResult};
use crate::core::git::Repo;
use crate::core::runner::Exec;
use crate::manifest::{self, GitPin};
use crate::release::ReleaseIdentity;
use crate::ui;
use clap::ValueEnum;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const CARGO_SOURCES: &str = "cargo-sources.json";

/// Workspace entries copied into the scratch build directory. The Flatpak
/// sandbox builds from this snapshot, not from the live checkout, so every
/// workspace member must be listed; a missing one breaks the sandboxed
/// `cargo build` long after staging.
const BUILD_SOURCES: &[&str] = &[
  "Cargo.toml",
  "Cargo.lock",
  "build.rs",
  "src",
  "data",
  "screenshots",
  "po",
  "transtools",
  "tiny_daemon",
  "sysd-manager-base",
  "sysd-manager-comcontroler",
  "sysd-manager-proxy",
  "sysd-manager-test-base",
  "sysd-manager-translating",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlathubAction {
  /// Delete local build state and the scratch build directory
  Clean,
  /// Stage sources, then build with the Flatpak builder
  Build,
  /// Run the installed Flatpak (best-effort, interrupt-safe)
  Run,
  /// Lint the manifest and the built repo
  Lint,
  /// Validate the metainfo, then lint
  Validate,
  /// Run appstreamcli compose on the build output
  Compose,
  /// Run flatpak repair for the user installation
  Repair,
  /// Generate cargo-sources.json from Cargo.lock
  Generate,
  /// Stage sources and the manifest into the scratch build directory
  Copy,
  /// Write the (optionally pinned) manifest into the scratch build directory
  Manifest,
  /// Clone the Flathub fork next to the checkout
  Clone,
  /// Empty the fork checkout, keeping its .git
  Cleanf,
  /// Generate, pin and push to the fork checkout
  Deploy,
  /// Copy the canonical manifest into the fork checkout
  Flathub,
}

pub fn run(
  cfg: &ReleaseConfig,
  action: FlathubAction,
  from_git: bool,
  logbus: bool,
  allow_dirty: bool,
) -> PackResult<()> {
  match action {
    FlathubAction::Clean => clean(cfg),
    FlathubAction::Build => build(cfg, from_git),
    FlathubAction::Run => run_app(cfg, logbus),
    FlathubAction::Lint => lint(cfg),
    FlathubAction::Validate => validate(cfg),
    FlathubAction::Compose => compose(cfg),
    FlathubAction::Repair => Exec::argv(["flatpak", "-v", "--user", "repair"]).run_required(),
    FlathubAction::Generate => generate(cfg, &cfg.flathub_dir),
    FlathubAction::Copy => stage_sources(cfg, from_git),
    FlathubAction::Manifest => set_manifest(cfg, from_git, &cfg.flatpak_build_dir),
    FlathubAction::Clone => clone_fork(cfg),
    FlathubAction::Cleanf => clean_fork(cfg),
    FlathubAction::Deploy => deploy(cfg, allow_dirty),
    FlathubAction::Flathub => {
      ui::step("Copy the manifest into the fork checkout");
      bundle::install_file(&cfg.manifest_source(), &cfg.flathub_dir)?;
      Ok(())
    }
  }
}

fn clean(cfg: &ReleaseConfig) -> PackResult<()> {
  for name in ["builddir", ".flatpak-builder", CARGO_SOURCES, "repo", "tmp"] {
    ui::warn(format!("Deleting {}", name));
    let path = cfg.workspace_root.join(name);
    if path.is_dir() {
      bundle::remove_dir(&path)?;
    } else if path.exists() {
      std::fs::remove_file(&path)?;
    }
  }

  ui::warn(format!("Deleting {}", cfg.flatpak_build_dir.display()));
  bundle::remove_dir(&cfg.flatpak_build_dir)
}

fn build(cfg: &ReleaseConfig, from_git: bool) -> PackResult<()> {
  stage_sources(cfg, from_git)?;

  ui::step("Add the Flathub repo user-wide");
  Exec::argv([
    "flatpak",
    "remote-add",
    "--if-not-exists",
    "--user",
    "flathub",
    "https://dl.flathub.org/repo/flathub.flatpakrepo",
  ])
  .run_required()?;

  ui::step("Building for flatpak");
  let manifest = cfg.manifest_name();
  Exec::argv([
    "flatpak",
    "run",
    "org.flatpak.Builder",
    "--force-clean",
    "--sandbox",
    "--user",
    "--install",
    "--install-deps-from=flathub",
    "--ccache",
    "--mirror-screenshots-url=https://dl.flathub.org/media",
    "--repo=repo",
    "builddir",
    manifest.as_str(),
  ])
  .cwd(&cfg.flatpak_build_dir)
  .run_required()
}

/// Run the installed Flatpak. Best-effort: a non-zero exit or an operator
/// interrupt ends the run without failing the pipeline.
fn run_app(cfg: &ReleaseConfig, logbus: bool) -> PackResult<()> {
  ui::step("Run the Flatpak");

  let interrupted = Arc::new(AtomicBool::new(false));
  let flag = interrupted.clone();
  ctrlc::set_handler(move || {
    flag.store(true, Ordering::SeqCst);
  })
  .map_err(|e| PackError::message(format!("Failed to set the interrupt handler: {}", e)))?;

  let mut argv = vec!["flatpak", "run"];
  if logbus {
    argv.push("--log-session-bus");
  }
  argv.push(&cfg.app_id);

  let code = Exec::argv(argv).env("RUST_LOG", "info").run_optional()?;

  if interrupted.load(Ordering::SeqCst) {
    println!("Program closed by keyboard interrupt");
  } else if code != 0 {
    ui::warn(format!("Flatpak run exited with code {}", code));
  }

  Ok(())
}

fn lint(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Lint manifest");
  let manifest = cfg.manifest_source().display().to_string();
  Exec::argv([
    "flatpak",
    "run",
    "--command=flatpak-builder-lint",
    "org.flatpak.Builder",
    "manifest",
    manifest.as_str(),
  ])
  .cwd(&cfg.workspace_root)
  .run_required()?;

  ui::step("Lint repo");
  Exec::argv([
    "flatpak",
    "run",
    "--command=flatpak-builder-lint",
    "org.flatpak.Builder",
    "repo",
    "repo",
  ])
  .cwd(&cfg.flatpak_build_dir)
  .run_required()
}

fn validate(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step(format!("Validating {}.metainfo.xml", cfg.app_id));
  let metainfo = cfg.metainfo().display().to_string();
  Exec::argv([
    "flatpak",
    "run",
    "--command=flatpak-builder-lint",
    "org.flatpak.Builder",
    "appstream",
    metainfo.as_str(),
  ])
  .cwd(&cfg.workspace_root)
  .run_required()?;

  lint(cfg)
}

fn compose(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("appstreamcli compose");
  Exec::argv(["appstreamcli", "compose", "builddir/files"])
    .cwd(&cfg.flatpak_build_dir)
    .run_required()
}

/// Generate `cargo-sources.json` for offline vendoring, then normalize it to
/// 4-space-indented JSON so diffs against the committed file stay quiet.
fn generate(cfg: &ReleaseConfig, out_dir: &Path) -> PackResult<()> {
  ui::step("Generate cargo sources");

  std::fs::create_dir_all(out_dir)?;
  let out_file = out_dir.join(CARGO_SOURCES);

  let lockfile = cfg.workspace_root.join("Cargo.lock").display().to_string();
  let out_arg = out_file.display().to_string();
  Exec::argv(["flatpak-cargo-generator", lockfile.as_str(), "-o", out_arg.as_str()]).run_required()?;

  let sources: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out_file)?)?;
  let mut buf = Vec::new();
  let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
  let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
  serde::Serialize::serialize(&sources, &mut ser)?;
  std::fs::write(&out_file, buf)?;

  println!("New cargo sources at {}", ui::detail(out_file.display().to_string()));
  Ok(())
}

fn stage_sources(cfg: &ReleaseConfig, from_git: bool) -> PackResult<()> {
  ui::step("Stage the sources for the Flatpak build");

  std::fs::create_dir_all(&cfg.flatpak_build_dir)?;
  generate(cfg, &cfg.flatpak_build_dir)?;
  copy_build_sources(&cfg.workspace_root, &cfg.flatpak_build_dir)?;

  set_manifest(cfg, from_git, &cfg.flatpak_build_dir)
}

/// Copy every entry of [`BUILD_SOURCES`] from the checkout into `out_dir`.
/// A missing entry is an error: an incomplete snapshot would only fail
/// inside the build sandbox, with a much worse diagnostic.
fn copy_build_sources(workspace_root: &Path, out_dir: &Path) -> PackResult<()> {
  for name in BUILD_SOURCES {
    let src = workspace_root.join(name);
    if src.is_dir() {
      bundle::install_tree(&src, &out_dir.join(name))?;
    } else if src.is_file() {
      bundle::install_file(&src, out_dir)?;
    } else {
      return Err(PackError::message(format!(
        "Workspace entry {} is missing; the snapshot would not build",
        src.display()
      )));
    }
  }
  Ok(())
}

/// Write the manifest into `out_dir`, pinned to the release tag when
/// `from_git` is set
fn set_manifest(cfg: &ReleaseConfig, from_git: bool, out_dir: &Path) -> PackResult<()> {
  std::fs::create_dir_all(out_dir)?;
  let out_file = out_dir.join(cfg.manifest_name());
  println!("Set manifest to {}", ui::detail(out_file.display().to_string()));

  let pin = if from_git {
    let identity = ReleaseIdentity::load(cfg)?;
    let tag = identity.tag();
    let repo = Repo::open(&cfg.workspace_root)?;
    let commit = identity.resolve_commit(&repo)?;

    println!("Pinning tag {} at commit {}", ui::detail(&tag), ui::detail(&commit));
    Some(GitPin {
      url: cfg.repo_url.clone(),
      tag,
      commit,
    })
  } else {
    println!("Manifest source stays local");
    None
  };

  manifest::write_manifest(&cfg.manifest_source(), &out_file, pin.as_ref())
}

fn clone_fork(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Clone the Flathub repository fork");

  let parent = cfg.flathub_dir.parent().ok_or_else(|| {
    PackError::message(format!("Fork checkout {} has no parent", cfg.flathub_dir.display()))
  })?;

  let dest = cfg.flathub_dir.display().to_string();
  Exec::argv([
    "git",
    "clone",
    "--branch=new-pr",
    "git@github.com:plrigaux/flathub.git",
    dest.as_str(),
  ])
  .cwd(parent)
  .run_required()
}

/// Empty the fork checkout so the next deployment starts from a known state.
/// The `.git` directory survives; everything else goes.
fn clean_fork(cfg: &ReleaseConfig) -> PackResult<()> {
  for entry in std::fs::read_dir(&cfg.flathub_dir)? {
    let entry = entry?;
    if entry.file_name() == ".git" {
      continue;
    }
    ui::warn(format!("Deleting {}", entry.path().display()));
    if entry.file_type()?.is_dir() {
      bundle::remove_dir(&entry.path())?;
    } else {
      std::fs::remove_file(entry.path())?;
    }
  }
  Ok(())
}

fn deploy(cfg: &ReleaseConfig, allow_dirty: bool) -> PackResult<()> {
  Repo::open(&cfg.workspace_root)?.require_clean(allow_dirty)?;

  ui::step("Set files for deployment on Flathub");

  generate(cfg, &cfg.flathub_dir)?;

  let fork = Repo::open(&cfg.flathub_dir)?;
  fork.pull_rebase()?;

  set_manifest(cfg, true, &cfg.flathub_dir)?;

  let tag = ReleaseIdentity::load(cfg)?.tag();
  fork.commit_all(&tag)?;
  fork.push()
}
