//! AppImage channel
//!
//! Stages an AppDir next to the checkout, bundles the non-excluded shared
//! libraries of the release binary into it, and hands the tree to
//! `appimagetool`. The AppDir is destroyed and recreated on every staging
//! run.

use crate::bundle;
use crate::bundle::deps;
use crate::channels;
use crate::core::config::ReleaseConfig;
use crate::core::error::{PackError, PackResult};
use crate::core::runner::Exec;
use crate::release::ReleaseIdentity;
use crate::ui;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppimageAction {
  /// Compile the release binary and the translation files
  Compile,
  /// Destroy and recreate the AppDir, then stage the application files
  Stage,
  /// Copy the binary's shared libraries into the AppDir
  Bundle,
  /// Run appimagetool on the staged AppDir
  Package,
  /// Compile, stage, bundle and package
  Build,
  /// Delete the AppImage output directory
  Clean,
}

pub fn run(cfg: &ReleaseConfig, action: AppimageAction) -> PackResult<()> {
  match action {
    AppimageAction::Compile => compile(cfg),
    AppimageAction::Stage => stage(cfg),
    AppimageAction::Bundle => bundle_libs(cfg),
    AppimageAction::Package => package(cfg),
    AppimageAction::Build => {
      compile(cfg)?;
      stage(cfg)?;
      bundle_libs(cfg)?;
      package(cfg)
    }
    AppimageAction::Clean => {
      ui::warn(format!("Deleting {}", cfg.appimage_dir.display()));
      bundle::remove_dir(&cfg.appimage_dir)
    }
  }
}

fn compile(cfg: &ReleaseConfig) -> PackResult<()> {
  channels::compile_app(cfg)?;
  channels::pack_translations(cfg)
}

fn stage(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Create the AppDir");

  let appdir = cfg.appdir();
  bundle::recreate_dir(&appdir)?;

  bundle::install_file(&cfg.release_binary(&cfg.binary), &appdir.join("usr/bin"))?;
  bundle::install_file(&channels::icon_file(cfg), &appdir)?;
  bundle::install_file(
    &channels::schema_file(cfg),
    &appdir.join("usr/share/glib-2.0/schemas"),
  )?;
  bundle::install_file(&channels::desktop_file(cfg), &appdir)?;
  bundle::install_file(
    &channels::localized_metainfo(cfg),
    &appdir.join("usr/share/metainfo"),
  )?;
  bundle::install_tree(&channels::locale_dir(cfg), &appdir.join("usr/share/locale"))?;

  ui::step("Compile schemas");
  let schemas_dir = appdir.join("usr/share/glib-2.0/schemas");
  let schemas_dir = schemas_dir.display().to_string();
  Exec::argv(["glib-compile-schemas", schemas_dir.as_str()]).run_required()?;

  // AppRun is the image entry point; it points at the staged binary.
  let apprun = appdir.join("AppRun");
  std::os::unix::fs::symlink(format!("./usr/bin/{}", cfg.binary), &apprun).map_err(|e| {
    PackError::message(format!("Failed to create {}: {}", apprun.display(), e))
  })?;

  Ok(())
}

fn bundle_libs(cfg: &ReleaseConfig) -> PackResult<()> {
  let copied = deps::bundle_libraries(
    &cfg.release_binary(&cfg.binary),
    &cfg.appdir().join("usr/lib"),
    &cfg.excluded_libs,
  )?;
  println!("Bundled {} shared libraries", ui::detail(copied.len().to_string()));
  Ok(())
}

fn package(cfg: &ReleaseConfig) -> PackResult<()> {
  let identity = ReleaseIdentity::load(cfg)?;

  ui::step("Packaging the AppImage");

  let image = cfg
    .appimage_dir
    .join(format!("{}-{}.AppImage", cfg.display_name, cfg.arch));

  Exec::argv([
    format!("appimagetool-{}.AppImage", cfg.arch),
    cfg.appdir().display().to_string(),
    image.display().to_string(),
  ])
  .env("ARCH", &cfg.arch)
  .env("VERSION", &identity.version)
  .run_required()?;

  println!("Created {}", ui::detail(image.display().to_string()));
  Ok(())
}
