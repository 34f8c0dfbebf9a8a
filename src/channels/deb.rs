//! Debian channel
//!
//! Stages the package root, renders the `DEBIAN/control` file from the
//! project metadata, builds the `.deb` with `dpkg-deb`, and can publish the
//! artifact as a hosted release with `gh`. Publishing is gated on a clean
//! working tree.

use crate::bundle;
use crate::channels;
use crate::core::config::ReleaseConfig;
use crate::core::error::{PackError, PackResult};
use crate::core::git::Repo;
use crate::core::runner::Exec;
use crate::release::ProjectMetadata;
use crate::ui;
use clap::ValueEnum;
use std::path::Path;

/// Runtime dependencies of the packaged application
const DEPENDS: &str =
  "libgtk-4-1 (>=4.20), libadwaita-1-0 (>=1.8), libsystemd0 (>=257), libgtksourceview-5-0 (>=5.16)";

const BUS_NAME: &str = "io.github.plrigaux.SysDManager";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DebAction {
  /// Compile the application, the proxy and the translation files
  Compile,
  /// Destroy and recreate the package root, then stage the files
  Stage,
  /// Render DEBIAN/control from the project metadata
  Control,
  /// Build the .deb with dpkg-deb
  Package,
  /// Compile, stage, control and package
  Generate,
  /// Generate, then publish the .deb as a hosted release
  Publish,
  /// Publish the already-built .deb without regenerating it
  JustPublish,
  /// Delete the package root
  Clean,
}

pub fn run(cfg: &ReleaseConfig, action: DebAction, allow_dirty: bool) -> PackResult<()> {
  match action {
    DebAction::Compile => compile(cfg),
    DebAction::Stage => stage(cfg),
    DebAction::Control => control(cfg),
    DebAction::Package => package(cfg),
    DebAction::Generate => generate(cfg),
    DebAction::Publish => {
      Repo::open(&cfg.workspace_root)?.require_clean(allow_dirty)?;
      generate(cfg)?;
      just_publish(cfg)
    }
    DebAction::JustPublish => {
      Repo::open(&cfg.workspace_root)?.require_clean(allow_dirty)?;
      just_publish(cfg)
    }
    DebAction::Clean => {
      ui::warn(format!("Deleting {}", cfg.deb_dir.display()));
      bundle::remove_dir(&cfg.deb_dir)
    }
  }
}

fn compile(cfg: &ReleaseConfig) -> PackResult<()> {
  channels::compile_proxy(cfg)?;
  channels::compile_app(cfg)?;
  channels::pack_translations(cfg)
}

fn stage(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Generate the package directory structure");

  let root = &cfg.deb_dir;
  bundle::recreate_dir(root)?;

  bundle::install_file(&cfg.release_binary(&cfg.binary), &root.join("usr/bin"))?;
  bundle::install_file(&cfg.release_binary(&cfg.proxy_binary), &root.join("usr/bin"))?;

  bundle::install_file(
    &channels::icon_file(cfg),
    &root.join("usr/share/icons/hicolor/scalable/apps"),
  )?;
  bundle::install_file(
    &channels::schema_file(cfg),
    &root.join("usr/share/glib-2.0/schemas"),
  )?;
  bundle::install_file(&channels::desktop_file(cfg), &root.join("usr/share/applications"))?;
  bundle::install_file(
    &channels::localized_metainfo(cfg),
    &root.join("usr/share/metainfo"),
  )?;
  bundle::install_tree(&channels::locale_dir(cfg), &root.join("usr/share/locale"))?;

  // The proxy ships templated D-Bus, polkit and systemd unit files; the
  // placeholders are resolved at staging time.
  let proxy_data = cfg.workspace_root.join(&cfg.proxy_binary).join("data");

  let conf = bundle::install_file(
    &proxy_data.join(format!("{}.conf", BUS_NAME)),
    &root.join("usr/share/dbus-1/system.d"),
  )?;
  substitute_placeholders(
    &conf,
    &[
      ("{BUS_NAME}", BUS_NAME),
      ("{DESTINATION}", BUS_NAME),
      ("{ENVIRONMENT}", ""),
      ("{INTERFACE}", BUS_NAME),
    ],
  )?;

  bundle::install_file(
    &proxy_data.join(format!("{}.policy", BUS_NAME)),
    &root.join("usr/share/polkit-1/actions"),
  )?;

  let service = bundle::install_file(
    &proxy_data.join(format!("{}.service", cfg.proxy_binary)),
    &root.join("usr/lib/systemd/system"),
  )?;
  substitute_placeholders(
    &service,
    &[
      ("{BUS_NAME}", BUS_NAME),
      ("{DESTINATION}", BUS_NAME),
      ("{ENVIRONMENT}", ""),
      ("{EXECUTABLE}", &format!("/usr/bin/{}", cfg.proxy_binary)),
      ("{INTERFACE}", BUS_NAME),
      ("{SERVICE_ID}", &cfg.proxy_binary),
    ],
  )?;

  Ok(())
}

fn substitute_placeholders(file: &Path, replacements: &[(&str, &str)]) -> PackResult<()> {
  let mut text = std::fs::read_to_string(file)?;
  for (placeholder, value) in replacements {
    text = text.replace(placeholder, value);
  }
  std::fs::write(file, text)?;
  Ok(())
}

fn control(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Generate the control file");

  let metadata = ProjectMetadata::load(&cfg.cargo_toml())?;
  let text = render_control(cfg, &metadata);

  let debian_dir = cfg.deb_dir.join("DEBIAN");
  std::fs::create_dir_all(&debian_dir)?;
  std::fs::write(debian_dir.join("control"), text)?;
  Ok(())
}

/// Render the control file. The release-number override appends a `-N`
/// suffix to the package version.
fn render_control(cfg: &ReleaseConfig, metadata: &ProjectMetadata) -> String {
  let version = match cfg.release_override {
    Some(release) => format!("{}-{}", metadata.version, release),
    None => metadata.version.clone(),
  };

  let fields = [
    ("Package", cfg.binary.as_str()),
    ("Version", &version),
    ("Maintainer", &metadata.author),
    ("Architecture", &cfg.deb_arch),
    ("Description", &metadata.description),
    ("Homepage", &metadata.repository),
    ("Depends", DEPENDS),
  ];

  let mut text = String::new();
  for (key, value) in fields {
    text.push_str(key);
    text.push_str(": ");
    text.push_str(value);
    text.push('\n');
  }
  text
}

fn package(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step(format!("Generate {}.deb", cfg.binary));

  let parent = cfg.deb_dir.parent().ok_or_else(|| {
    PackError::message(format!("Package root {} has no parent", cfg.deb_dir.display()))
  })?;

  Exec::argv(["dpkg-deb", "--build", "--root-owner-group", cfg.binary.as_str()])
    .cwd(parent)
    .run_required()
}

fn just_publish(cfg: &ReleaseConfig) -> PackResult<()> {
  let metadata = ProjectMetadata::load(&cfg.cargo_toml())?;

  ui::step(format!("Publishing version {}", metadata.version));

  let deb = cfg
    .deb_dir
    .parent()
    .map(|p| p.join(format!("{}.deb", cfg.binary)))
    .ok_or_else(|| {
      PackError::message(format!("Package root {} has no parent", cfg.deb_dir.display()))
    })?;

  let title = format!("Release {}", metadata.version);
  let notes = format!("See {}/blob/main/CHANGELOG.md", metadata.repository);
  let deb = deb.display().to_string();

  Exec::argv([
    "gh",
    "release",
    "create",
    metadata.version.as_str(),
    "--title",
    title.as_str(),
    "--notes",
    notes.as_str(),
    deb.as_str(),
  ])
  .cwd(&cfg.workspace_root)
  .run_required()
}

fn generate(cfg: &ReleaseConfig) -> PackResult<()> {
  compile(cfg)?;
  stage(cfg)?;
  control(cfg)?;
  package(cfg)
}
