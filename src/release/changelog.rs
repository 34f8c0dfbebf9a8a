//! Changelog synthesis from AppStream metainfo
//!
//! The application's metainfo XML is the single structured record of its
//! releases. This module turns the `<release>` elements into a
//! Keep-a-Changelog Markdown document. The transform is pure and
//! order-preserving: releases are emitted in document order (newest first,
//! as the metainfo keeps them) and re-running it on unchanged input produces
//! byte-identical output.

use crate::core::config::ReleaseConfig;
use crate::core::error::{PackError, PackResult, ResultExt};
use crate::ui;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as _;

/// The fixed Keep-a-Changelog category vocabulary
pub const CATEGORIES: [&str; 6] = ["Added", "Changed", "Deprecated", "Removed", "Fixed", "Security"];

const PREAMBLE: &str = "# Changelog
All notable changes to this project will be documented in this file.

The format is based on [Keep a Changelog](https://keepachangelog.com/en/1.1.0/),
and this project adheres to [Semantic Versioning](https://semver.org/spec/v2.0.0.html).

";

/// One `<release>` element: version, date, and its raw description markup
#[derive(Debug, Default, Clone)]
pub struct ReleaseNote {
  pub version: String,
  pub date: String,
  pub description: String,
}

/// Extract release notes from metainfo XML, preserving document order
pub fn parse_metainfo(xml: &str) -> PackResult<Vec<ReleaseNote>> {
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text(true);

  let mut notes = Vec::new();
  let mut note = ReleaseNote::default();
  let mut in_release = false;

  loop {
    match reader.read_event()? {
      Event::Start(e) => match e.name().as_ref() {
        b"release" => {
          in_release = true;
          note = ReleaseNote::default();

          for attr in e.attributes() {
            let attr = attr.map_err(|e| PackError::message(format!("metainfo attribute error: {}", e)))?;
            match attr.key.local_name().as_ref() {
              b"version" => note.version = String::from_utf8_lossy(&attr.value).to_string(),
              b"date" => note.date = String::from_utf8_lossy(&attr.value).to_string(),
              _ => (),
            }
          }
        }
        b"description" if in_release => {
          note.description = reader.read_text(e.name())?.to_string();
        }
        _ => (),
      },
      Event::End(e) if e.name().as_ref() == b"release" => {
        notes.push(note.clone());
        in_release = false;
      }
      Event::Eof => break,
      _ => (),
    }
  }

  Ok(notes)
}

/// Render release notes as a Markdown changelog.
///
/// Paragraph text matching a category name becomes a `###` heading, other
/// paragraph text is prose, list items are bullets. No sorting, no
/// deduplication: the metainfo order is the changelog order.
pub fn synthesize(notes: &[ReleaseNote]) -> PackResult<String> {
  let mut out = String::from(PREAMBLE);

  for note in notes {
    let _ = writeln!(out, "## [{}] - {}\n", note.version, note.date);
    render_description(&mut out, &note.description)?;
    out.push('\n');
  }

  Ok(out)
}

fn render_description(out: &mut String, description: &str) -> PackResult<()> {
  let mut reader = Reader::from_str(description);
  reader.config_mut().trim_text(true);

  loop {
    match reader.read_event()? {
      Event::Start(e) => match e.name().as_ref() {
        b"p" => {
          let text = reader.read_text(e.name())?;
          if CATEGORIES.contains(&text.as_ref()) {
            let _ = writeln!(out, "### {}\n", text);
          } else {
            let _ = writeln!(out, "{}\n", text);
          }
        }
        b"li" => {
          let text = reader.read_text(e.name())?;
          let _ = writeln!(out, "- {}", text);
        }
        _ => (),
      },
      Event::Eof => break,
      _ => (),
    }
  }

  Ok(())
}

/// Generate `CHANGELOG.md` in the workspace root from the metainfo file
pub fn run_changelog(cfg: &ReleaseConfig) -> PackResult<()> {
  ui::step("Generate CHANGELOG.md");

  let metainfo_path = cfg.metainfo();
  let xml = std::fs::read_to_string(&metainfo_path)
    .with_context(|| format!("Failed to read {}", metainfo_path.display()))?;

  let notes = parse_metainfo(&xml)?;
  let changelog = synthesize(&notes)?;

  let out_path = cfg.workspace_root.join("CHANGELOG.md");
  std::fs::write(&out_path, &changelog)?;

  println!("Wrote {} ({} releases)", ui::detail(out_path.display().to_string()), notes.len());
  Ok(())
}
