//! Packaging channels
//!
//! One module per distribution channel:
//!
//! - **appimage**: portable AppImage with bundled shared libraries
//! - **deb**: Debian binary package, optionally published as a hosted release
//! - **aur**: PKGBUILD generation and push to the AUR checkout
//! - **flathub**: local Flatpak builds and deployment to the Flathub fork
//!
//! Every channel runs the same strictly sequential pipeline: Compiling,
//! Staging, (DependencyResolving for the AppImage), Packaging, and an
//! optional Publishing step that is gated on a clean working tree. Steps
//! never overlap and each one finishes before the next starts.

pub mod appimage;
pub mod aur;
pub mod deb;
pub mod flathub;

use crate::core::config::ReleaseConfig;
use crate::core::error::PackResult;
use crate::core::runner::Exec;
use crate::ui;
use std::path::PathBuf;

/// Compile the application in release mode
pub fn compile_app(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Compiling");
  Exec::argv(["cargo", "build", "--release", "--features", "default"])
    .cwd(&cfg.workspace_root)
    .run_required()
}

/// Compile the privilege-escalation backend in release mode
pub fn compile_proxy(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Compiling the proxy");
  let manifest = format!("{}/Cargo.toml", cfg.proxy_binary);
  Exec::argv(["cargo", "build", "--manifest-path", manifest.as_str(), "--release"])
    .cwd(&cfg.workspace_root)
    .run_required()
}

/// Generate the translation files (compiled catalogs plus the localized
/// desktop and metainfo files under `target/loc`)
pub fn pack_translations(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Generating translation files");
  Exec::argv(["cargo", "run", "-p", "transtools", "--", "packfiles"])
    .cwd(&cfg.workspace_root)
    .run_required()
}

/// Scalable application icon shipped with the sources
pub fn icon_file(cfg: &ReleaseConfig) -> PathBuf {
  cfg
    .workspace_root
    .join("data/icons/hicolor/scalable/apps")
    .join(format!("{}.svg", cfg.app_id))
}

/// GSettings schema shipped with the sources
pub fn schema_file(cfg: &ReleaseConfig) -> PathBuf {
  cfg
    .workspace_root
    .join("data/schemas")
    .join(format!("{}.gschema.xml", cfg.app_id))
}

/// Localized desktop entry produced by the translation step
pub fn desktop_file(cfg: &ReleaseConfig) -> PathBuf {
  cfg
    .workspace_root
    .join("target/loc")
    .join(format!("{}.desktop", cfg.app_id))
}

/// Localized metainfo produced by the translation step
pub fn localized_metainfo(cfg: &ReleaseConfig) -> PathBuf {
  cfg
    .workspace_root
    .join("target/loc")
    .join(format!("{}.metainfo.xml", cfg.app_id))
}

/// Compiled message catalogs produced by the translation step
pub fn locale_dir(cfg: &ReleaseConfig) -> PathBuf {
  cfg.workspace_root.join("target/locale")
}
