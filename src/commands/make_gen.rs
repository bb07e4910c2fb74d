//! `makeGen`: only rewrite the go:generate comment files

use std::path::PathBuf;

use anyhow::Result;

use super::load_project;
use crate::build::generate::write_generate_files;
use crate::utils::terminal::{print_field, print_success};

pub struct MakeGenCommand {
    pub conf: PathBuf,
}

impl MakeGenCommand {
    pub fn execute(self, _verbose: bool) -> Result<()> {
        let (config, project_path) = load_project(&self.conf)?;
        print_field("WorkDir", project_path.display());

        let written = write_generate_files(&config, &project_path)?;
        print_success(&format!("Wrote {} go:generate file(s)", written.len()));
        Ok(())
    }
}
