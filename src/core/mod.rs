//! Core infrastructure: command execution, git backend, errors, configuration

pub mod config;
pub mod error;
pub mod git;
pub mod runner;
