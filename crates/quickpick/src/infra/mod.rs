//! Infrastructure adapters for processes, git, config, and the host editor.

pub mod config;
pub mod finder;
pub mod git;
pub mod host;
pub mod walker;
