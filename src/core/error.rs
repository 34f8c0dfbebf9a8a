//! Error types for sysd-packager with contextual messages and exit codes
//!
//! Every failure surfaces to the caller; only `main` is allowed to terminate
//! the process, and it does so with the code reported by [`PackError::exit_code`]:
//! the child's exit code for a failed external command, the reserved code 101
//! for a dirty working tree, and 1 for everything else.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Reserved exit code for the dirty-tree precondition failure.
///
/// Kept distinct from ordinary command failures so CI wrappers can tell
/// "refused to release" apart from "a packaging tool broke".
pub const EXIT_DIRTY_TREE: i32 = 101;

/// Main error type for sysd-packager
#[derive(Debug)]
pub enum PackError {
  /// An external command exited with a non-zero code
  Command {
    command: String,
    code: i32,
    detail: Option<String>,
  },

  /// An external command could not be started at all
  Spawn { command: String, source: io::Error },

  /// The working tree has uncommitted or untracked changes
  DirtyTree,

  /// A git tag could not be resolved to a commit
  TagNotFound { tag: String },

  /// A tag was created locally but its push failed
  TagUnpushed { tag: String, reason: String },

  /// A shared library reported by the dependency lister has no resolved path
  UnresolvedLibrary { soname: String },

  /// Project metadata is missing or malformed
  Metadata { path: PathBuf, reason: String },

  /// The Flatpak manifest could not be read, pinned or written
  Manifest { reason: String },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl PackError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    PackError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    PackError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      PackError::Message { message, context, help } => PackError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      // A bare I/O error says nothing about which file or step was involved;
      // the context becomes the leading line of the message.
      PackError::Io(e) => PackError::Message {
        message: e.to_string(),
        context: Some(ctx_str),
        help: None,
      },
      // Structured variants keep their identity (and exit code); they are
      // already descriptive enough on their own.
      other => other,
    }
  }

  /// Get the process exit code for this error
  pub fn exit_code(&self) -> i32 {
    match self {
      PackError::Command { code, .. } => {
        if *code != 0 {
          *code
        } else {
          1
        }
      }
      PackError::DirtyTree => EXIT_DIRTY_TREE,
      _ => 1,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      PackError::DirtyTree => {
        Some("Commit or stash your changes, or pass --allow-dirty to override.".to_string())
      }
      PackError::TagNotFound { tag } => Some(format!(
        "The release has not been tagged yet. Create and push the tag with `sysd-packager tag` (expected tag: {}).",
        tag
      )),
      PackError::TagUnpushed { tag, .. } => Some(format!(
        "The local tag exists but the remote does not have it. Push it manually with `git push origin tag {}` or delete it with `git tag -d {}`.",
        tag, tag
      )),
      PackError::UnresolvedLibrary { soname } => Some(format!(
        "Install the package providing {} or add its stem to the exclusion set.",
        soname
      )),
      PackError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for PackError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PackError::Command { command, code, detail } => {
        write!(f, "Command failed with code {}: {}", code, command)?;
        if let Some(detail) = detail {
          let detail = detail.trim_end();
          if !detail.is_empty() {
            write!(f, "\n{}", detail)?;
          }
        }
        Ok(())
      }
      PackError::Spawn { command, source } => {
        write!(f, "Failed to start command: {} ({})", command, source)
      }
      PackError::DirtyTree => {
        write!(f, "The working tree has uncommitted or untracked changes")
      }
      PackError::TagNotFound { tag } => {
        write!(f, "Tag '{}' does not resolve to a commit", tag)
      }
      PackError::TagUnpushed { tag, reason } => {
        write!(
          f,
          "Tag '{}' was created locally but could not be pushed: {}",
          tag, reason
        )
      }
      PackError::UnresolvedLibrary { soname } => {
        write!(f, "Shared library '{}' has no resolved path", soname)
      }
      PackError::Metadata { path, reason } => {
        write!(f, "Invalid project metadata in {}: {}", path.display(), reason)
      }
      PackError::Manifest { reason } => {
        write!(f, "Flatpak manifest error: {}", reason)
      }
      PackError::Io(e) => write!(f, "I/O error: {}", e),
      PackError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for PackError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      PackError::Io(e) => Some(e),
      PackError::Spawn { source, .. } => Some(source),
      _ => None,
    }
  }
}

impl From<io::Error> for PackError {
  fn from(err: io::Error) -> Self {
    PackError::Io(err)
  }
}

impl From<String> for PackError {
  fn from(msg: String) -> Self {
    PackError::message(msg)
  }
}

impl From<&str> for PackError {
  fn from(msg: &str) -> Self {
    PackError::message(msg)
  }
}

impl From<toml_edit::TomlError> for PackError {
  fn from(err: toml_edit::TomlError) -> Self {
    PackError::message(format!("TOML parse error: {}", err))
  }
}

impl From<serde_json::Error> for PackError {
  fn from(err: serde_json::Error) -> Self {
    PackError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for PackError {
  fn from(err: serde_yaml::Error) -> Self {
    PackError::Manifest {
      reason: err.to_string(),
    }
  }
}

impl From<quick_xml::Error> for PackError {
  fn from(err: quick_xml::Error) -> Self {
    PackError::message(format!("XML parse error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for PackError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    PackError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Result type alias for sysd-packager
pub type PackResult<T> = Result<T, PackError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> PackResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> PackResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<PackError>,
{
  fn context(self, ctx: impl Into<String>) -> PackResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> PackResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &PackError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
