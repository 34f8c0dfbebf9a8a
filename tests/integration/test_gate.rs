//! Integration tests for the dirty-tree gate

use crate::helpers::{TestRepo, run_packager};
use anyhow::Result;

const EXIT_DIRTY_TREE: i32 = 101;

#[test]
fn test_publish_refuses_a_dirty_tree() -> Result<()> {
  let repo = TestRepo::new()?;
  std::fs::write(repo.path.join("scratch.txt"), "uncommitted")?;

  let output = run_packager(&repo.path, &["deb", "just-publish"])?;

  assert_eq!(output.status.code(), Some(EXIT_DIRTY_TREE));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("uncommitted or untracked"));
  assert!(stderr.contains("--allow-dirty"));

  Ok(())
}

#[test]
fn test_untracked_files_count_as_dirty() -> Result<()> {
  // an untracked file, not a modified one
  let repo = TestRepo::new()?;
  std::fs::create_dir_all(repo.path.join("notes"))?;
  std::fs::write(repo.path.join("notes").join("todo.txt"), "x")?;

  let output = run_packager(&repo.path, &["flathub", "deploy"])?;
  assert_eq!(output.status.code(), Some(EXIT_DIRTY_TREE));

  Ok(())
}

#[test]
fn test_tag_refuses_a_dirty_tree() -> Result<()> {
  let repo = TestRepo::new()?;
  std::fs::write(repo.path.join("Cargo.toml"), "# broken edit")?;

  let output = run_packager(&repo.path, &["tag"])?;
  assert_eq!(output.status.code(), Some(EXIT_DIRTY_TREE));

  Ok(())
}
