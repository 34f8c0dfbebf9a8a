//! Shared-library dependency bundling for the portable AppImage
//!
//! The dynamic linker's dependency lister (`ldd`) is the only practical
//! interface for the full transitive closure; its textual output is parsed
//! line by line. Lines that do not match `<soname> => <path>` (the vDSO, the
//! loader itself) are skipped. A matched soname with no resolved path aborts
//! bundling with a diagnostic naming the library, because copying an absent
//! path downstream would be a far less readable failure.

use crate::core::error::{PackError, PackResult};
use crate::core::runner::Exec;
use crate::ui;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One dependency reported by the lister
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDep {
  pub soname: String,
  /// Absent when the lister reports the library as not found
  pub path: Option<PathBuf>,
}

/// Parse dependency-lister output.
///
/// Keeps only lines containing ` => `; the right-hand side must be an
/// absolute path (anything else, such as a bare load address, does not match
/// the pattern and the line is skipped). `not found` yields a dep with an
/// absent path so the caller can escalate it.
pub fn parse_ldd(output: &str) -> Vec<LibraryDep> {
  let mut deps = Vec::new();

  for line in output.lines() {
    let line = line.trim();
    let Some((left, right)) = line.split_once(" => ") else {
      continue;
    };

    let Some(soname) = left.split_whitespace().next() else {
      continue;
    };

    let right = right.trim();
    if right.starts_with("not found") {
      deps.push(LibraryDep {
        soname: soname.to_string(),
        path: None,
      });
      continue;
    }

    match right.split_whitespace().next() {
      Some(token) if token.starts_with('/') => deps.push(LibraryDep {
        soname: soname.to_string(),
        path: Some(PathBuf::from(token)),
      }),
      _ => continue,
    }
  }

  deps
}

/// Strip the `.so[.N...]` suffix from a soname: `libgtk-4.so.1` → `libgtk-4`
pub fn soname_stem(soname: &str) -> &str {
  match soname.find(".so") {
    Some(idx) => &soname[..idx],
    None => soname,
  }
}

/// Decide which dependencies to copy.
///
/// Excluded stems are dropped; an unresolved dependency that is not excluded
/// is an error. Order is preserved, so the result is deterministic for a
/// fixed lister output.
pub fn select_libraries(deps: Vec<LibraryDep>, excluded: &HashSet<String>) -> PackResult<Vec<(String, PathBuf)>> {
  let mut selected = Vec::new();

  for dep in deps {
    if excluded.contains(soname_stem(&dep.soname)) {
      ui::warn(format!("Excluded from bundle: {}", dep.soname));
      continue;
    }

    match dep.path {
      Some(path) => selected.push((dep.soname, path)),
      None => return Err(PackError::UnresolvedLibrary { soname: dep.soname }),
    }
  }

  Ok(selected)
}

/// Copy the executable's non-excluded shared libraries into `lib_dir`
pub fn bundle_libraries(exe: &Path, lib_dir: &Path, excluded: &HashSet<String>) -> PackResult<Vec<PathBuf>> {
  ui::step(format!("Bundling shared libraries of {}", exe.display()));

  let exe_arg = exe.display().to_string();
  let output = Exec::argv(["ldd", exe_arg.as_str()]).run_capture()?;
  let selected = select_libraries(parse_ldd(&output), excluded)?;

  let mut copied = Vec::new();
  for (soname, path) in selected {
    if !path.exists() {
      return Err(PackError::UnresolvedLibrary { soname });
    }
    let dest = super::install_file(&path, lib_dir)?;
    println!("Bundled {} from {}", ui::detail(&soname), path.display());
    copied.push(dest);
  }

  Ok(copied)
}
