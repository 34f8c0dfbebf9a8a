//! Per-run release configuration
//!
//! One [`ReleaseConfig`] is built at startup and passed to every channel
//! assembler. It owns everything the shell-era scripts kept as module-level
//! constants: application identity, staging directories, the library
//! exclusion set, and the target architecture markers.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Library name stems never copied into a portable bundle.
///
/// These are either guaranteed present on every target system (glibc and the
/// loader) or blacklisted by the AppImage tooling because bundling them
/// breaks host integration (GL, X11/Wayland client stacks, dbus, systemd).
pub const EXCLUDED_LIB_STEMS: &[&str] = &[
  "ld-linux",
  "ld-linux-x86-64",
  "libc",
  "libm",
  "libdl",
  "libpthread",
  "librt",
  "libresolv",
  "libgcc_s",
  "libstdc++",
  "libGL",
  "libGLX",
  "libGLdispatch",
  "libEGL",
  "libX11",
  "libxcb",
  "libwayland-client",
  "libdbus-1",
  "libsystemd",
  "libfontconfig",
  "libfreetype",
];

/// Explicit configuration for one release run
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
  /// Checkout of the application being packaged
  pub workspace_root: PathBuf,

  /// AppStream application id
  pub app_id: String,

  /// Main binary name (also the Debian package name)
  pub binary: String,

  /// Privilege-escalation backend binary
  pub proxy_binary: String,

  /// Human-facing name used in artifact filenames
  pub display_name: String,

  /// Clone URL embedded in pinned manifests
  pub repo_url: String,

  /// Target architecture marker for AppImage tooling
  pub arch: String,

  /// Target architecture marker for Debian packaging
  pub deb_arch: String,

  /// AppImage output directory (contains the AppDir and the final image)
  pub appimage_dir: PathBuf,

  /// Debian package root (destroyed and recreated on every staging run)
  pub deb_dir: PathBuf,

  /// AUR source checkout (a git repository; artifacts inside are cleaned,
  /// the checkout itself is not destroyed)
  pub aur_dir: PathBuf,

  /// PKGBUILD template directory inside the workspace
  pub aur_template_dir: PathBuf,

  /// Flathub fork checkout used for submission
  pub flathub_dir: PathBuf,

  /// Scratch directory for local Flatpak builds
  pub flatpak_build_dir: PathBuf,

  /// Directory holding the canonical Flatpak manifest
  pub manifest_dir: PathBuf,

  /// Library stems excluded from the AppImage bundle
  pub excluded_libs: HashSet<String>,

  /// Debian release-number override (`-N` suffix on the package version)
  pub release_override: Option<u32>,
}

impl ReleaseConfig {
  /// Build the default configuration rooted at the application checkout
  pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
    let workspace_root = workspace_root.into();
    let parent = workspace_root
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from(".."));
    let app_id = "io.github.plrigaux.sysd-manager".to_string();

    Self {
      app_id: app_id.clone(),
      binary: "sysd-manager".to_string(),
      proxy_binary: "sysd-manager-proxy".to_string(),
      display_name: "SysD-Manager".to_string(),
      repo_url: "https://github.com/plrigaux/sysd-manager.git".to_string(),
      arch: "x86_64".to_string(),
      deb_arch: "amd64".to_string(),
      appimage_dir: parent.join("AppImage"),
      deb_dir: parent.join("deb").join("sysd-manager"),
      aur_dir: parent.join("aur").join("sysd-manager"),
      aur_template_dir: workspace_root.join("packaging").join("aur"),
      flathub_dir: parent.join(&app_id),
      flatpak_build_dir: parent.join("flatpak_sysdm"),
      manifest_dir: workspace_root.join("packaging").join("flathub"),
      excluded_libs: EXCLUDED_LIB_STEMS.iter().map(|s| s.to_string()).collect(),
      release_override: None,
      workspace_root,
    }
  }

  /// Path to the project metadata file (source of truth for the version)
  pub fn cargo_toml(&self) -> PathBuf {
    self.workspace_root.join("Cargo.toml")
  }

  /// Path to the AppStream metainfo file the changelog is derived from
  pub fn metainfo(&self) -> PathBuf {
    self
      .workspace_root
      .join("data")
      .join("metainfo")
      .join(format!("{}.metainfo.xml", self.app_id))
  }

  /// The AppDir staged for AppImage packaging
  pub fn appdir(&self) -> PathBuf {
    self.appimage_dir.join(format!("{}.AppDir", self.display_name))
  }

  /// Compiled release binary
  pub fn release_binary(&self, name: &str) -> PathBuf {
    self.workspace_root.join("target").join("release").join(name)
  }

  /// Flatpak manifest filename
  pub fn manifest_name(&self) -> String {
    format!("{}.yaml", self.app_id)
  }

  /// Canonical (unpinned) Flatpak manifest path
  pub fn manifest_source(&self) -> PathBuf {
    self.manifest_dir.join(self.manifest_name())
  }
}
