//! Integration tests driving the packager binary against real git fixtures

mod helpers;
mod test_changelog;
mod test_gate;
mod test_manifest;
mod test_tag;
