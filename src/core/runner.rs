//! External command execution
//!
//! Every packaging tool (cargo, git, dpkg-deb, makepkg, appimagetool, the
//! Flatpak builder) is driven through [`Exec`]. The failure policy is encoded
//! in the operation, not a flag:
//!
//! - [`Exec::run_required`]: non-zero exit is an error carrying the child's
//!   exit code; the CLI dispatcher turns it into the process exit code.
//! - [`Exec::run_optional`]: the exit code is returned for inspection;
//!   used for best-effort steps such as a convenience commit or a tool that
//!   may not be installed.
//! - [`Exec::run_capture`]: required policy plus decoded stdout; used
//!   wherever a later step parses command output (ldd, makepkg -g,
//!   makepkg --printsrcinfo).
//!
//! Each invocation is attempted exactly once; a transient failure is surfaced
//! to the operator, never silently retried.

use crate::core::error::{PackError, PackResult};
use crate::ui;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// How a command line is interpreted.
///
/// `Argv` is executed directly as an argument vector. `ShellLine` is handed
/// to `sh -c` and is only for call sites that need shell features (globs,
/// conditionals). The two cannot be confused at a call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
  Argv(Vec<String>),
  ShellLine(String),
}

impl Invocation {
  /// Build an argument-vector invocation
  pub fn argv<I, S>(args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Invocation::Argv(args.into_iter().map(Into::into).collect())
  }

  /// Build a shell-line invocation
  pub fn shell(line: impl Into<String>) -> Self {
    Invocation::ShellLine(line.into())
  }

  /// The command line as shown to the operator
  pub fn display_line(&self) -> String {
    match self {
      Invocation::Argv(args) => args.join(" "),
      Invocation::ShellLine(line) => line.clone(),
    }
  }
}

/// A single external command invocation: immutable once constructed,
/// attempted exactly once.
#[derive(Debug)]
pub struct Exec {
  invocation: Invocation,
  cwd: Option<PathBuf>,
  env: Vec<(String, String)>,
  quiet: bool,
}

impl Exec {
  pub fn new(invocation: Invocation) -> Self {
    Self {
      invocation,
      cwd: None,
      env: Vec::new(),
      quiet: false,
    }
  }

  /// Shorthand for an argv invocation
  pub fn argv<I, S>(args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::new(Invocation::argv(args))
  }

  /// Shorthand for a shell-line invocation
  pub fn shell(line: impl Into<String>) -> Self {
    Self::new(Invocation::shell(line))
  }

  /// Run in a working directory other than the current one
  pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
    self.cwd = Some(dir.as_ref().to_path_buf());
    self
  }

  /// Overlay an environment variable onto the child's environment
  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.push((key.into(), value.into()));
    self
  }

  /// Suppress the command echo
  pub fn quiet(mut self) -> Self {
    self.quiet = true;
    self
  }

  fn command(&self) -> Command {
    let mut cmd = match &self.invocation {
      Invocation::Argv(args) => {
        let mut cmd = Command::new(args.first().map(String::as_str).unwrap_or(""));
        cmd.args(&args[1..]);
        cmd
      }
      Invocation::ShellLine(line) => {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
      }
    };

    if let Some(dir) = &self.cwd {
      cmd.current_dir(dir);
    }
    for (key, value) in &self.env {
      cmd.env(key, value);
    }

    cmd
  }

  fn echo(&self) {
    if self.quiet {
      return;
    }
    if let Some(dir) = &self.cwd {
      ui::cwd(dir.display().to_string());
    }
    ui::command(self.invocation.display_line());
  }

  /// Run the command; a non-zero exit is fatal to the calling pipeline.
  pub fn run_required(&self) -> PackResult<()> {
    let code = self.run_optional()?;
    if code != 0 {
      return Err(PackError::Command {
        command: self.invocation.display_line(),
        code,
        detail: None,
      });
    }
    Ok(())
  }

  /// Run the command and hand the exit code back to the caller.
  ///
  /// Failure to spawn the process at all is still an error; "the tool ran
  /// and said no" and "the tool is not installed" are different situations.
  pub fn run_optional(&self) -> PackResult<i32> {
    self.echo();

    let status = self.command().status().map_err(|source| PackError::Spawn {
      command: self.invocation.display_line(),
      source,
    })?;

    // A signal-terminated child has no exit code; 1 is enough here, the
    // interrupt case is handled by the caller that installed the handler.
    Ok(status.code().unwrap_or(1))
  }

  /// Run the command and capture decoded stdout; required failure policy.
  pub fn run_capture(&self) -> PackResult<String> {
    self.echo();

    let output = self
      .command()
      .stderr(Stdio::inherit())
      .output()
      .map_err(|source| PackError::Spawn {
        command: self.invocation.display_line(),
        source,
      })?;

    if !output.status.success() {
      // whatever the tool managed to print is the best diagnostic we have
      let detail = String::from_utf8_lossy(&output.stdout).trim().to_string();
      return Err(PackError::Command {
        command: self.invocation.display_line(),
        code: output.status.code().unwrap_or(1),
        detail: (!detail.is_empty()).then_some(detail),
      });
    }

    Ok(String::from_utf8(output.stdout)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_line_joins_argv() {
    let inv = Invocation::argv(["git", "push", "origin", "tag", "v1.2.3"]);
    assert_eq!(inv.display_line(), "git push origin tag v1.2.3");
  }

  #[test]
  fn test_capture_returns_stdout() {
    let out = Exec::argv(["echo", "hello"]).quiet().run_capture().unwrap();
    assert_eq!(out.trim(), "hello");
  }

  #[test]
  fn test_required_failure_carries_exit_code() {
    let err = Exec::shell("exit 7").quiet().run_required().unwrap_err();
    match err {
      PackError::Command { code, .. } => assert_eq!(code, 7),
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[test]
  fn test_capture_failure_carries_partial_output() {
    let err = Exec::shell("echo no PKGBUILD here; exit 5")
      .quiet()
      .run_capture()
      .unwrap_err();
    match &err {
      PackError::Command { code, detail, .. } => {
        assert_eq!(*code, 5);
        assert_eq!(detail.as_deref(), Some("no PKGBUILD here"));
      }
      other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("no PKGBUILD here"));
  }

  #[test]
  fn test_optional_returns_code_to_caller() {
    let code = Exec::shell("exit 3").quiet().run_optional().unwrap();
    assert_eq!(code, 3);
    let code = Exec::argv(["true"]).quiet().run_optional().unwrap();
    assert_eq!(code, 0);
  }

  #[test]
  fn test_spawn_failure_is_distinct_from_command_failure() {
    let err = Exec::argv(["definitely-not-a-real-tool-xyz"])
      .quiet()
      .run_optional()
      .unwrap_err();
    assert!(matches!(err, PackError::Spawn { .. }));
  }

  #[test]
  fn test_shell_line_supports_shell_features() {
    let code = Exec::shell("[ -z \"$(echo)\" ]").quiet().run_optional().unwrap();
    assert_eq!(code, 0);
  }

  #[test]
  fn test_env_overlay_reaches_child() {
    let out = Exec::shell("printf %s \"$PACKAGER_MARKER\"")
      .env("PACKAGER_MARKER", "x86_64")
      .quiet()
      .run_capture()
      .unwrap();
    assert_eq!(out, "x86_64");
  }

  #[test]
  fn test_cwd_override() {
    let dir = tempfile::tempdir().unwrap();
    let out = Exec::argv(["pwd"])
      .cwd(dir.path())
      .quiet()
      .run_capture()
      .unwrap();
    assert_eq!(
      std::fs::canonicalize(out.trim()).unwrap(),
      std::fs::canonicalize(dir.path()).unwrap()
    );
  }
}
