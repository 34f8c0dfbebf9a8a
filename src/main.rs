mod bundle;
mod channels;
mod core;
mod manifest;
mod release;
mod ui;

use channels::appimage::AppimageAction;
use channels::aur::AurAction;
use channels::deb::DebAction;
use channels::flathub::FlathubAction;
use clap::{Parser, Subcommand};
use crate::core::config::ReleaseConfig;
use crate::core::error::{PackError, print_error};
use crate::core::git::Repo;

/// Release packaging orchestrator for sysd-manager
#[derive(Parser)]
#[command(name = "sysd-packager")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the portable AppImage
  Appimage {
    /// Pipeline step to run
    #[arg(value_enum)]
    action: AppimageAction,
  },

  /// Build and publish the Debian package
  Deb {
    /// Pipeline step to run
    #[arg(value_enum)]
    action: DebAction,
    /// Debian release number (appends -N to the package version)
    #[arg(short, long)]
    release: Option<u32>,
    /// Allow uncommitted files when publishing
    #[arg(short = 'd', long)]
    allow_dirty: bool,
  },

  /// Generate and push the AUR package files
  Aur {
    /// Pipeline step to run
    #[arg(value_enum)]
    action: AurAction,
  },

  /// Build, validate and deploy the Flatpak
  Flathub {
    /// Pipeline step to run
    #[arg(value_enum)]
    action: FlathubAction,
    /// Pin the manifest source to the release tag in git
    #[arg(short = 'g', long)]
    from_git: bool,
    /// Log session bus messages when running the Flatpak
    #[arg(long)]
    logbus: bool,
    /// Allow uncommitted files when deploying
    #[arg(short = 'd', long)]
    allow_dirty: bool,
  },

  /// Create the release tag from the package version and push it
  Tag {
    /// Replace an existing tag of the same name
    #[arg(short, long)]
    force: bool,
    /// Allow uncommitted files
    #[arg(short = 'd', long)]
    allow_dirty: bool,
    /// Tag annotation message (defaults to "version <tag>")
    #[arg(short, long)]
    message: Option<String>,
  },

  /// Generate CHANGELOG.md from the AppStream metainfo releases
  Changelog,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();

  // The tool runs from anywhere inside the application checkout; all paths
  // are anchored at the repository top level.
  let current_dir = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(PackError::message(format!(
      "Failed to get the current directory: {}",
      e
    ))),
  };

  let workspace_root = match Repo::open(&current_dir) {
    Ok(repo) => repo.root().to_path_buf(),
    Err(e) => handle_error(e),
  };

  let mut cfg = ReleaseConfig::new(workspace_root);

  let result = match cli.command {
    Commands::Appimage { action } => channels::appimage::run(&cfg, action),
    Commands::Deb {
      action,
      release,
      allow_dirty,
    } => {
      cfg.release_override = release;
      channels::deb::run(&cfg, action, allow_dirty)
    }
    Commands::Aur { action } => channels::aur::run(&cfg, action),
    Commands::Flathub {
      action,
      from_git,
      logbus,
      allow_dirty,
    } => channels::flathub::run(&cfg, action, from_git, logbus, allow_dirty),
    Commands::Tag {
      force,
      allow_dirty,
      message,
    } => release::run_tag(&cfg, force, allow_dirty, message),
    Commands::Changelog => release::changelog::run_changelog(&cfg),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: PackError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code());
}
