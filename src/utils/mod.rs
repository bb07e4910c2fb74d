//! Shared helpers for terminal output, project paths and git metadata

pub mod git;
pub mod paths;
pub mod terminal;
