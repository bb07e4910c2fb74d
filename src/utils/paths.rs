//! Path utilities: project lookup and file staging helpers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::error::{hints, BuilderError};

/// GOPATH entries in lookup order, defaulting to `~/go`
pub fn gopath_entries() -> Vec<PathBuf> {
    match std::env::var_os("GOPATH") {
        Some(value) if !value.is_empty() => std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect(),
        _ => directories::BaseDirs::new()
            .map(|dirs| vec![dirs.home_dir().join("go")])
            .unwrap_or_default(),
    }
}

/// Find the source directory of a Go import path (`<gopath>/src/<project>`)
pub fn find_src_path(project: &str) -> Result<PathBuf> {
    find_src_path_in(project, &gopath_entries())
}

/// Find the source directory of a Go import path within specific GOPATH roots
pub fn find_src_path_in(project: &str, gopaths: &[PathBuf]) -> Result<PathBuf> {
    let mut searched = Vec::with_capacity(gopaths.len());
    for gopath in gopaths {
        let candidate = gopath.join("src").join(project);
        if candidate.is_dir() {
            return Ok(candidate);
        }
        searched.push(candidate);
    }

    Err(BuilderError::ProjectNotFound {
        project: project.to_string(),
        searched,
        hint: hints::project_not_found().to_string(),
    }
    .into())
}

/// The directory the import path is rooted in (the GOPATH `src` directory).
///
/// Falls back to the parent directory when the project path does not end
/// with the import path (an explicitly configured `project_path`).
pub fn work_dir_for(project_path: &Path, project: &str) -> PathBuf {
    if !project.is_empty() && project_path.ends_with(project) {
        let depth = Path::new(project).components().count();
        let mut dir = project_path;
        for _ in 0..depth {
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        return dir.to_path_buf();
    }

    project_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project_path.to_path_buf())
}

/// Make a path absolute against the current directory
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    Ok(current_dir.join(path))
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Copy a file, creating the destination's parent directories
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    std::fs::copy(src, dst)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Copy a directory recursively
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("Failed to read {}", src.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .context("Failed to get relative path")?;
        let dest = dst.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&dest)?;
        } else {
            copy_file(entry.path(), &dest)?;
        }
    }
    Ok(())
}
