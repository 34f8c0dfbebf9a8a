//! Styled console output
//!
//! The packager narrates every step and echoes every external command before
//! running it, so a release log doubles as a reproduction script. Styling
//! follows the conventions the shell scripts established: steps in bold cyan,
//! working-directory changes in green, command lines in cyan, warnings in
//! yellow.

use anstyle::{AnsiColor, Style};

const STEP: Style = Style::new().bold().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Cyan)));
const COMMAND: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Cyan)));
const CWD: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Green)));
const WARN: Style = Style::new().bold().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Yellow)));
const DETAIL: Style = Style::new().bold();

/// Announce a pipeline step (compiling, staging, packaging, ...)
pub fn step(msg: impl AsRef<str>) {
  println!("{STEP}{}{STEP:#}", msg.as_ref());
}

/// Echo a command line before it is executed
pub fn command(line: impl AsRef<str>) {
  println!("{COMMAND}{}{COMMAND:#}", line.as_ref());
}

/// Echo a working-directory override
pub fn cwd(dir: impl AsRef<str>) {
  println!("{CWD}Working dir: {}{CWD:#}", dir.as_ref());
}

/// Warn about a recoverable condition (best-effort step failed, skipped file)
pub fn warn(msg: impl AsRef<str>) {
  eprintln!("{WARN}{}{WARN:#}", msg.as_ref());
}

/// Highlight a value inside a narration line (version, tag, artifact name)
pub fn detail(msg: impl AsRef<str>) -> String {
  format!("{DETAIL}{}{DETAIL:#}", msg.as_ref())
}
