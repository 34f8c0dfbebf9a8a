//! AUR channel
//!
//! Fills the PKGBUILD template with the released version and the commit its
//! tag resolves to, splices the `makepkg -g` checksums in, regenerates
//! `.SRCINFO`, and pushes the result from the AUR checkout. The checkout is
//! a git repository of its own; cleaning removes build artifacts, never the
//! checkout itself.

use crate::core::config::ReleaseConfig;
use crate::core::error::{PackError, PackResult, ResultExt};
use crate::core::git::Repo;
use crate::core::runner::Exec;
use crate::release::ReleaseIdentity;
use crate::ui;
use clap::ValueEnum;

const PKGBUILD: &str = "PKGBUILD";
const INSTALL_FILE: &str = "sysd-manager.install";
const CHECKSUM_MARKER: &str = "sha256sums=()\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AurAction {
  /// Fill the PKGBUILD template and copy the install file and changelog
  Generate,
  /// Splice the makepkg -g checksums into the PKGBUILD
  Sum,
  /// Regenerate .SRCINFO with makepkg --printsrcinfo
  Srcinfo,
  /// Generate, sum and srcinfo
  Gen,
  /// Gen, then build the package locally with makepkg
  Make,
  /// Commit and push the AUR checkout
  Push,
  /// Gen, then push
  Genpush,
  /// Delete build artifacts from the AUR checkout
  Clean,
}

pub fn run(cfg: &ReleaseConfig, action: AurAction) -> PackResult<()> {
  match action {
    AurAction::Generate => generate(cfg),
    AurAction::Sum => checksum(cfg),
    AurAction::Srcinfo => srcinfo(cfg),
    AurAction::Gen => gen_all(cfg),
    AurAction::Make => {
      gen_all(cfg)?;
      Exec::argv(["makepkg"]).cwd(&cfg.aur_dir).run_required()
    }
    AurAction::Push => push(cfg),
    AurAction::Genpush => {
      gen_all(cfg)?;
      push(cfg)
    }
    AurAction::Clean => clean(cfg),
  }
}

/// Fill the `pkgver=` and `_commit=` lines of the PKGBUILD template.
///
/// The markers must be present as empty assignments; a template that drifted
/// away from that shape is reported instead of silently passed through.
fn fill_pkgbuild(template: &str, version: &str, commit: &str) -> PackResult<String> {
  for marker in ["pkgver=\n", "_commit=\n"] {
    if !template.contains(marker) {
      return Err(PackError::with_help(
        format!("PKGBUILD template has no '{}' line", marker.trim_end()),
        "The template must carry empty pkgver= and _commit= assignments to fill in.",
      ));
    }
  }

  Ok(
    template
      .replace("pkgver=\n", &format!("pkgver={}\n", version))
      .replace("_commit=\n", &format!("_commit={}\n", commit)),
  )
}

/// Replace the empty `sha256sums=()` line with the makepkg -g output
fn splice_checksums(pkgbuild: &str, sums: &str) -> PackResult<String> {
  if !pkgbuild.contains(CHECKSUM_MARKER) {
    return Err(PackError::with_help(
      "PKGBUILD has no empty sha256sums=() line to splice over",
      "Regenerate the PKGBUILD first (aur generate).",
    ));
  }
  Ok(pkgbuild.replace(CHECKSUM_MARKER, sums))
}

fn generate(cfg: &ReleaseConfig) -> PackResult<()> {
  let identity = ReleaseIdentity::load(cfg)?;
  let tag = identity.tag();

  println!("Version {}", ui::detail(&identity.version));
  println!("Tag name {}", ui::detail(&tag));

  let repo = Repo::open(&cfg.workspace_root)?;
  let commit = identity.resolve_commit(&repo)?;
  println!("Commit {}", ui::detail(&commit));

  let template_path = cfg.aur_template_dir.join(PKGBUILD);
  let template = std::fs::read_to_string(&template_path)
    .with_context(|| format!("Failed to read {}", template_path.display()))?;

  let pkgbuild = fill_pkgbuild(&template, &identity.version, &commit)?;

  std::fs::create_dir_all(&cfg.aur_dir)?;
  std::fs::write(cfg.aur_dir.join(PKGBUILD), pkgbuild)?;

  crate::bundle::install_file(&cfg.aur_template_dir.join(INSTALL_FILE), &cfg.aur_dir)?;
  crate::bundle::install_file(&cfg.workspace_root.join("CHANGELOG.md"), &cfg.aur_dir)?;

  Ok(())
}

fn checksum(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Splice source checksums into the PKGBUILD");

  let sums = Exec::argv(["makepkg", "-g"]).cwd(&cfg.aur_dir).run_capture()?;

  let path = cfg.aur_dir.join(PKGBUILD);
  let pkgbuild = std::fs::read_to_string(&path)?;
  std::fs::write(&path, splice_checksums(&pkgbuild, &sums)?)?;

  Ok(())
}

fn srcinfo(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Write .SRCINFO");

  let srcinfo = Exec::argv(["makepkg", "--printsrcinfo"])
    .cwd(&cfg.aur_dir)
    .run_capture()?;

  std::fs::write(cfg.aur_dir.join(".SRCINFO"), srcinfo)?;
  Ok(())
}

fn gen_all(cfg: &ReleaseConfig) -> PackResult<()> {
  generate(cfg)?;
  checksum(cfg)?;
  srcinfo(cfg)
}

fn push(cfg: &ReleaseConfig) -> PackResult<()> {
  let identity = ReleaseIdentity::load(cfg)?;
  let tag = identity.tag();

  ui::step("Push on AUR");

  let aur_repo = Repo::open(&cfg.aur_dir)?;
  aur_repo.commit_all(&tag)?;
  aur_repo.push()
}

fn clean(cfg: &ReleaseConfig) -> PackResult<()> {
  let artifacts = [PKGBUILD, "src", "sysd-manager", "pkg", ".SRCINFO", INSTALL_FILE];

  for name in artifacts {
    ui::warn(format!("Deleting {}", name));
    let path = cfg.aur_dir.join(name);
    if path.is_dir() {
      crate::bundle::remove_dir(&path)?;
    } else if path.exists() {
      std::fs::remove_file(&path)?;
    }
  }

  // built packages, glob expanded by the shell
  ui::warn("Deleting *.zst");
  Exec::shell("rm -f ./*.zst").cwd(&cfg.aur_dir).run_required()
}
