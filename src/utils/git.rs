// Git metadata lookups for build stamping

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::error::{hints, BuilderError};
use crate::exec::subprocess::command_exists;

/// Full commit hash of HEAD in the project repository
pub fn commit_id(project_root: &Path) -> Result<String> {
    if !command_exists("git") {
        return Err(
            BuilderError::missing_tool("git", "embedding the commit id", hints::git()).into(),
        );
    }

    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(project_root)
        .output()
        .context("Failed to get git commit")?;

    if !output.status.success() {
        bail!(
            "git rev-parse HEAD failed in {}: {}",
            project_root.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    parse_commit(&String::from_utf8_lossy(&output.stdout))
}

/// Extract the commit hash from `git rev-parse` output
fn parse_commit(stdout: &str) -> Result<String> {
    let commit = stdout.trim();
    if commit.is_empty() {
        bail!("git rev-parse HEAD returned no commit");
    }
    Ok(commit.to_string())
}
