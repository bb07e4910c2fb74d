//! Output normalization, SHA-256 sidecars and tar.gz packaging
//!
//! Single-file builds end as a renamed binary plus its checksum in the dist
//! directory. Multi-file builds stage the binary, the configured copy files
//! and empty dirs into `<dist>/<exe>_<os>_<arch>/`, which is then packed into
//! `<exe>_<os>_<arch>.tar.gz` and removed:
//!
//! ```text
//! dist/
//! ├── nging-linux-amd64            # single-file
//! ├── nging-linux-amd64.sha256
//! ├── nging_linux_arm-7.tar.gz     # multi-file
//! └── nging_linux_arm-7.tar.gz.sha256
//! ```

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use glob::Pattern;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use super::params::BuildParam;
use crate::error::{BuilderError, Step};
use crate::utils::paths::{copy_dir_all, copy_file, ensure_dir};

const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Hex SHA-256 digest of a file
pub fn sha256_hex(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Path of the checksum sidecar: `<file>.sha256`
pub fn checksum_path(path: &Path) -> PathBuf {
    let mut sidecar = OsString::from(path.as_os_str());
    sidecar.push(".sha256");
    PathBuf::from(sidecar)
}

/// Write `<hex> <basename>` next to the file
pub fn write_checksum(path: &Path) -> Result<PathBuf> {
    let digest = sha256_hex(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sidecar = checksum_path(path);

    std::fs::write(&sidecar, format!("{} {}", digest, name))
        .with_context(|| format!("Failed to write {}", sidecar.display()))?;
    Ok(sidecar)
}

/// First file matching `<escaped dir>/<pattern>`
fn first_match(dir: &Path, pattern: &str) -> Option<PathBuf> {
    let full = format!("{}/{}", Pattern::escape(&dir.to_string_lossy()), pattern);
    glob::glob(&full)
        .ok()?
        .filter_map(Result::ok)
        .find(|p| p.is_file())
}

/// Locate the compiler's artifact for this target.
///
/// xgo may embed a platform version in the name (`nging-windows-4.0-amd64.exe`),
/// so single-file mode tries `<exe>-<os>-*-<arch>` patterns before the plain
/// names. Multi-file mode takes the first `<exe>-<os>*` in the release directory.
fn find_artifact(param: &BuildParam) -> Option<PathBuf> {
    let dir = &param.release_dir;
    let exe = param.executor();
    let os = param.target.os();

    if !param.ctx.single_file {
        return first_match(dir, &format!("{}-{}*", exe, os));
    }

    let arch = param.target.arch();
    let versioned = first_match(dir, &format!("{}-{}-*-{}{}", exe, os, arch, param.extension))
        .or_else(|| first_match(dir, &format!("{}-{}-*-{}", exe, os, arch)));
    if versioned.is_some() {
        return versioned;
    }

    [
        param.artifact_path(),
        dir.join(format!("{}{}", param.artifact_name(), param.extension)),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

/// Remove a binary and checksum left in the shared dist dir by an earlier run
pub fn remove_previous_output(param: &BuildParam) -> Result<()> {
    if !param.ctx.single_file {
        return Ok(());
    }

    let binary = param.binary_path();
    for path in [checksum_path(&binary), binary] {
        if path.is_file() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }
    Ok(())
}

/// Rename the compiled artifact to its final name and write its checksum
pub fn normalize_output(param: &BuildParam) -> Result<PathBuf> {
    let artifact = find_artifact(param).ok_or_else(|| {
        BuilderError::step_failed(
            param.target.to_string(),
            Step::Normalize,
            format!("no build output found in {}", param.release_dir.display()),
        )
    })?;

    let binary = param.binary_path();
    if artifact != binary {
        std::fs::rename(&artifact, &binary).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                artifact.display(),
                binary.display()
            )
        })?;
    }

    write_checksum(&binary)?;
    Ok(binary)
}

/// Copy `copy_files` and create `make_dirs` inside the release directory
pub fn stage_files(param: &BuildParam) -> Result<()> {
    let config = &param.ctx.config;
    let project = &param.ctx.project_path;
    let release = &param.release_dir;

    for entry in &config.copy_files {
        if entry.contains('*') {
            let pattern = format!("{}/{}", Pattern::escape(&project.to_string_lossy()), entry);
            let matches = glob::glob(&pattern)
                .with_context(|| format!("Invalid copy pattern: {}", entry))?;
            for path in matches {
                let path = path.with_context(|| format!("Failed to expand {}", entry))?;
                let relative = path
                    .strip_prefix(project)
                    .context("Failed to get relative path")?;
                stage_path(&path, &release.join(relative))?;
            }
        } else {
            stage_path(&project.join(entry), &release.join(entry))?;
        }
    }

    for dir in &config.make_dirs {
        ensure_dir(&release.join(dir))?;
    }

    Ok(())
}

fn stage_path(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        copy_dir_all(src, dst)
    } else {
        copy_file(src, dst)
    }
}

/// Pack a directory into a gzip-compressed tar; entry names are relative to it
pub fn create_tar_gz(source_dir: &Path, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path)
        .with_context(|| format!("Failed to create archive: {}", archive_path.display()))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        let relative = path
            .strip_prefix(source_dir)
            .context("Failed to get relative path")?;

        if relative.as_os_str().is_empty() {
            continue;
        }

        if entry.file_type().is_dir() {
            builder
                .append_dir(relative, path)
                .with_context(|| {
                    format!("Failed to add directory to archive: {}", relative.display())
                })?;
        } else {
            builder
                .append_path_with_name(path, relative)
                .with_context(|| {
                    format!("Failed to add file to archive: {}", relative.display())
                })?;
        }
    }

    let encoder = builder.into_inner().context("Failed to finish tar archive")?;
    encoder.finish().context("Failed to compress tar archive")?;
    Ok(())
}

/// Stage, archive, remove the release directory and checksum the archive
pub fn package(param: &BuildParam) -> Result<PathBuf> {
    stage_files(param)?;

    let archive = param.archive_path();
    create_tar_gz(&param.release_dir, &archive)?;
    std::fs::remove_dir_all(&param.release_dir).with_context(|| {
        format!("Failed to remove {}", param.release_dir.display())
    })?;
    write_checksum(&archive)?;

    Ok(archive)
}
