//! Flatpak manifest source pinning
//!
//! The canonical manifest builds from the local checkout. For a Flathub
//! submission the first source of the first module is replaced by a git
//! source pinned to the release tag and its commit. A manifest pinned to a
//! tag without a commit cannot reproducibly build, so pinning refuses to
//! write anything when the commit is missing.

use crate::core::error::{PackError, PackResult};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// The pinned git source written into the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitPin {
  pub url: String,
  pub tag: String,
  pub commit: String,
}

impl GitPin {
  fn to_value(&self) -> Value {
    // Key order matches the manifests Flathub reviewers are used to.
    let mut source = Mapping::new();
    source.insert(Value::from("type"), Value::from("git"));
    source.insert(Value::from("url"), Value::from(self.url.as_str()));
    source.insert(Value::from("tag"), Value::from(self.tag.as_str()));
    source.insert(Value::from("commit"), Value::from(self.commit.as_str()));
    Value::Mapping(source)
  }
}

/// Replace `modules[0].sources[0]` with the pinned git source
pub fn pin_first_source(manifest: &mut Value, pin: &GitPin) -> PackResult<()> {
  if pin.commit.is_empty() {
    return Err(PackError::Manifest {
      reason: format!("refusing to pin tag '{}' without a commit", pin.tag),
    });
  }

  let sources = manifest
    .get_mut("modules")
    .and_then(|m| m.get_mut(0))
    .and_then(|m| m.get_mut("sources"))
    .and_then(|s| s.as_sequence_mut())
    .ok_or_else(|| PackError::Manifest {
      reason: "no modules[0].sources list in manifest".to_string(),
    })?;

  if sources.is_empty() {
    return Err(PackError::Manifest {
      reason: "modules[0].sources is empty".to_string(),
    });
  }

  sources[0] = pin.to_value();
  Ok(())
}

/// Read the manifest, optionally pin it, and write it to `out`.
///
/// With `pin = None` the manifest passes through with its local-source
/// configuration untouched. On any error nothing is written.
pub fn write_manifest(manifest_in: &Path, out: &Path, pin: Option<&GitPin>) -> PackResult<()> {
  let text = std::fs::read_to_string(manifest_in).map_err(|e| PackError::Manifest {
    reason: format!("failed to read {}: {}", manifest_in.display(), e),
  })?;

  let mut manifest: Value = serde_yaml::from_str(&text)?;

  if let Some(pin) = pin {
    pin_first_source(&mut manifest, pin)?;
  }

  let rendered = serde_yaml::to_string(&manifest)?;
  std::fs::write(out, rendered).map_err(|e| PackError::Manifest {
    reason: format!("failed to write {}: {}", out.display(), e),
  })?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const MANIFEST: &str = r#"
app-id: io.github.plrigaux.sysd-manager
runtime: org.gnome.Platform
runtime-version: "48"
sdk: org.gnome.Sdk
modules:
  - name: sysd-manager
    buildsystem: simple
    sources:
      - type: dir
        path: .
      - cargo-sources.json
"#;

  fn pin() -> GitPin {
    GitPin {
      url: "https://github.com/plrigaux/sysd-manager.git".to_string(),
      tag: "v1.2.3".to_string(),
      commit: "0123456789abcdef0123456789abcdef01234567".to_string(),
    }
  }

  #[test]
  fn test_pin_replaces_first_source_only() {
    let mut manifest: Value = serde_yaml::from_str(MANIFEST).unwrap();
    pin_first_source(&mut manifest, &pin()).unwrap();

    let sources = &manifest["modules"][0]["sources"];
    assert_eq!(sources[0]["type"], Value::from("git"));
    assert_eq!(sources[0]["tag"], Value::from("v1.2.3"));
    assert_eq!(
      sources[0]["commit"],
      Value::from("0123456789abcdef0123456789abcdef01234567")
    );
    // the cargo-sources entry is untouched
    assert_eq!(sources[1], Value::from("cargo-sources.json"));
  }

  #[test]
  fn test_empty_commit_is_refused() {
    let mut manifest: Value = serde_yaml::from_str(MANIFEST).unwrap();
    let bad = GitPin {
      commit: String::new(),
      ..pin()
    };
    let err = pin_first_source(&mut manifest, &bad).unwrap_err();
    assert!(err.to_string().contains("without a commit"));
  }

  #[test]
  fn test_manifest_without_sources_is_an_error() {
    let mut manifest: Value = serde_yaml::from_str("app-id: x").unwrap();
    let err = pin_first_source(&mut manifest, &pin()).unwrap_err();
    assert!(err.to_string().contains("modules[0].sources"));
  }

  #[test]
  fn test_write_manifest_pinned_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("manifest.yaml");
    let out = tmp.path().join("out.yaml");
    std::fs::write(&src, MANIFEST).unwrap();

    write_manifest(&src, &out, Some(&pin())).unwrap();

    let written: Value = serde_yaml::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["modules"][0]["sources"][0]["type"], Value::from("git"));
    assert_eq!(written["app-id"], Value::from("io.github.plrigaux.sysd-manager"));
  }

  #[test]
  fn test_unpinned_manifest_keeps_local_source() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("manifest.yaml");
    let out = tmp.path().join("out.yaml");
    std::fs::write(&src, MANIFEST).unwrap();

    write_manifest(&src, &out, None).unwrap();

    let written: Value = serde_yaml::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["modules"][0]["sources"][0]["type"], Value::from("dir"));
  }

  #[test]
  fn test_failed_pin_writes_no_file() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("manifest.yaml");
    let out = tmp.path().join("out.yaml");
    std::fs::write(&src, "app-id: x").unwrap();

    assert!(write_manifest(&src, &out, Some(&pin())).is_err());
    assert!(!out.exists());
  }
}
