//! Staged bundle trees
//!
//! Every channel stages its artifact into a filesystem subtree that is
//! destroyed and recreated at the start of each packaging run. Nothing is
//! ever updated in place; a staged tree always reflects exactly one run.

pub mod deps;

use crate::core::error::{PackError, PackResult};
use std::path::{Path, PathBuf};

/// Destroy and recreate a staging directory
pub fn recreate_dir(dir: &Path) -> PackResult<()> {
  match std::fs::remove_dir_all(dir) {
    Ok(()) => {}
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
    Err(e) => return Err(e.into()),
  }
  std::fs::create_dir_all(dir)?;
  Ok(())
}

/// Remove a directory tree if it exists
pub fn remove_dir(dir: &Path) -> PackResult<()> {
  match std::fs::remove_dir_all(dir) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e.into()),
  }
}

/// Install a file into a directory, creating the directory first.
///
/// `std::fs::copy` preserves permission bits, so an executable stays
/// executable in the staged tree.
pub fn install_file(src: &Path, dest_dir: &Path) -> PackResult<PathBuf> {
  let name = src
    .file_name()
    .ok_or_else(|| PackError::message(format!("Not a file path: {}", src.display())))?;

  std::fs::create_dir_all(dest_dir)?;
  let dest = dest_dir.join(name);
  std::fs::copy(src, &dest).map_err(|e| {
    PackError::message(format!(
      "Failed to install {} into {}: {}",
      src.display(),
      dest_dir.display(),
      e
    ))
  })?;

  Ok(dest)
}

/// Recursively copy a directory tree into `dest_dir`
pub fn install_tree(src: &Path, dest_dir: &Path) -> PackResult<()> {
  std::fs::create_dir_all(dest_dir)?;

  for entry in std::fs::read_dir(src)? {
    let entry = entry?;
    let path = entry.path();
    if entry.file_type()?.is_dir() {
      install_tree(&path, &dest_dir.join(entry.file_name()))?;
    } else {
      install_file(&path, dest_dir)?;
    }
  }

  Ok(())
}
