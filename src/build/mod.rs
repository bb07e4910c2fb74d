//! Cross-compilation build orchestration
//!
//! ## Architecture
//!
//! ```text
//! CLI → targets (selection) → params (per-target derivation)
//!     → driver → toolchain (go / xgo) → archive (rename, checksum, tar.gz)
//! ```
//!
//! ## Modules
//!
//! - `targets` - Target registry and CLI target selection
//! - `params` - Per-target build parameters: tags, linker flags, output paths
//! - `toolchain` - Process invocations for `go generate`, `go build` and `xgo`
//! - `generate` - `//go:generate` bindata comment files
//! - `archive` - Output normalization, SHA-256 sidecars and tar.gz packaging
//! - `driver` - The sequential per-target state machine

pub mod archive;
pub mod driver;
pub mod generate;
pub mod params;
pub mod targets;
pub mod toolchain;

use std::path::PathBuf;

use chrono::Local;

use crate::config::Config;
use crate::utils::paths::work_dir_for;

/// Layout of the timestamp injected as `main.BUILD_TIME`
pub const BUILD_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Run-wide values shared read-only by every target
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Effective configuration
    pub config: Config,
    /// Project source directory
    pub project_path: PathBuf,
    /// Directory the import path is rooted in (GOPATH `src`)
    pub work_dir: PathBuf,
    /// Where binaries and archives are written
    pub dist_dir: PathBuf,
    /// Build timestamp (`BUILD_TIME_FORMAT`)
    pub build_time: String,
    /// HEAD commit of the project
    pub commit_id: String,
    /// Strip symbols from the binaries
    pub minify: bool,
    /// Bare binaries, no per-target packaging
    pub single_file: bool,
}

impl BuildContext {
    /// Create a new build context stamped with the current local time
    pub fn new(
        config: Config,
        project_path: PathBuf,
        dist_dir: PathBuf,
        commit_id: String,
        minify: bool,
    ) -> Self {
        let work_dir = work_dir_for(&project_path, &config.project);
        let single_file = config.is_single_file();
        Self {
            config,
            project_path,
            work_dir,
            dist_dir,
            build_time: Local::now().format(BUILD_TIME_FORMAT).to_string(),
            commit_id,
            minify,
            single_file,
        }
    }

    /// Replace the build timestamp
    #[cfg(test)]
    pub fn with_build_time(mut self, build_time: impl Into<String>) -> Self {
        self.build_time = build_time.into();
        self
    }

    pub fn executor(&self) -> &str {
        &self.config.executor
    }
}
