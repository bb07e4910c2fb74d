//! Command implementations
//!
//! Each command module provides a struct with an `execute` method; the CLI
//! picks one from the positional tokens.

pub mod build;
pub mod gen_config;
pub mod make_gen;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::utils::paths::{absolutize, find_src_path};

/// Load the builder config and locate the project it describes
pub(crate) fn load_project(conf: &Path) -> Result<(Config, PathBuf)> {
    let config = Config::load_from_path(conf)?;
    let project_path = resolve_project_path(&config)?;
    Ok((config, project_path))
}

/// `project_path` when configured, else `<GOPATH>/src/<project>`
pub(crate) fn resolve_project_path(config: &Config) -> Result<PathBuf> {
    let path = match &config.project_path {
        Some(path) => path.clone(),
        None => find_src_path(&config.project)?,
    };
    absolutize(&path)
}
