//! Configuration validation with helpful error messages

use anyhow::Result;
use regex::Regex;

use super::Config;
use crate::error::BuilderError;
use crate::utils::terminal::print_warning;

/// Validate the effective configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_executor(&config.executor)?;
    validate_version(&config.version)?;

    if config.project.trim().is_empty() {
        return Err(BuilderError::config_error_with_hint(
            "project cannot be empty",
            None,
            "Set project to the Go import path, e.g. project = \"github.com/admpub/nging\"",
        )
        .into());
    }

    validate_targets(config)?;
    validate_relative_paths("copy_files", &config.copy_files)?;
    validate_relative_paths("make_dirs", &config.make_dirs)?;

    if !config.startup_package.is_empty() && config.startup_package.starts_with('@') {
        return Err(BuilderError::config_error_with_hint(
            format!("startup_package '{}' has no path", config.startup_package),
            None,
            "Use the form <path>[@v<version>], e.g. startup_package = \"./cmd/startup@v0.1.0\"",
        )
        .into());
    }

    Ok(())
}

/// The binary name is used verbatim in file names
fn validate_executor(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(BuilderError::config_error_with_hint(
            format!("Invalid executor name '{}'", name),
            None,
            "executor is the output binary name, e.g. executor = \"nging\"",
        )
        .into());
    }
    Ok(())
}

/// Versions are injected verbatim as `-X main.VERSION=<version>`, so any
/// single token works; non-semver values only get a warning.
fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() || version.chars().any(char::is_whitespace) {
        return Err(BuilderError::config_error_with_hint(
            format!("Invalid version '{}'", version),
            None,
            "The version must be a single token without spaces, e.g. \"5.2.6\"",
        )
        .into());
    }

    let bare = version.strip_prefix('v').unwrap_or(version);
    if semver::Version::parse(bare).is_err() {
        print_warning(&format!("version '{}' is not a semantic version", version));
    }
    Ok(())
}

fn validate_targets(config: &Config) -> Result<()> {
    let name_re = Regex::new(r"^[A-Za-z0-9]+(_[A-Za-z0-9.\-]+)+$")?;
    let canonical_re = Regex::new(r"^[a-z0-9]+/[a-z0-9.]+(-[a-z0-9.]+)?$")?;

    for (name, canonical) in &config.targets {
        if !name_re.is_match(name) {
            return Err(BuilderError::config_error_with_hint(
                format!("Invalid target name '{}'", name),
                None,
                "Target names look like <os>_<arch>, e.g. linux_riscv64",
            )
            .into());
        }
        if !canonical_re.is_match(canonical) {
            return Err(BuilderError::config_error_with_hint(
                format!("Invalid target '{}' for '{}'", canonical, name),
                None,
                "Targets look like <os>/<arch>[-<revision>], e.g. linux/riscv64 or linux/arm-7",
            )
            .into());
        }
    }
    Ok(())
}

/// Staged paths are joined onto the project and release directories
fn validate_relative_paths(field: &str, paths: &[String]) -> Result<()> {
    for path in paths {
        if path.is_empty() || path.starts_with('/') || path.split('/').any(|seg| seg == "..") {
            return Err(BuilderError::config_error_with_hint(
                format!("Invalid {} entry '{}'", field, path),
                None,
                format!("{} entries must be relative paths inside the project", field),
            )
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        validate_config(&Config::default()).unwrap();
    }

    #[test]
    fn test_version_with_v_prefix() {
        validate_version("v1.2.3").unwrap();
        validate_version("5.2.6").unwrap();
    }

    #[test]
    fn test_free_form_versions_accepted() {
        for version in ["5.2", "5.3.0.1", "nightly-20240102"] {
            validate_version(version).unwrap();
        }

        let mut config = Config::default();
        config.version = "5.2".to_string();
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_version_must_be_single_token() {
        assert!(validate_version("").is_err());
        assert!(validate_version("5.2 beta").is_err());
    }

    #[test]
    fn test_executor_with_separator_rejected() {
        assert!(validate_executor("bin/nging").is_err());
        assert!(validate_executor("").is_err());
        validate_executor("nging").unwrap();
    }

    #[test]
    fn test_targets_validation() {
        let mut config = Config::default();
        config
            .targets
            .insert("linux_riscv64".to_string(), "linux/riscv64".to_string());
        config
            .targets
            .insert("linux_arm7".to_string(), "linux/arm-7".to_string());
        validate_config(&config).unwrap();

        config
            .targets
            .insert("freebsd_amd64".to_string(), "freebsd-amd64".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_copy_files_must_stay_inside_project() {
        let mut config = Config::default();
        config.copy_files.push("../secrets".to_string());
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.make_dirs.push("/var/log".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_startup_package_needs_path() {
        let mut config = Config::default();
        config.startup_package = "@v1.0.0".to_string();
        assert!(validate_config(&config).is_err());

        config.startup_package = "./startup@v1.0.0".to_string();
        validate_config(&config).unwrap();
    }
}
