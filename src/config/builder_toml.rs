//! builder.toml parsing
//!
//! # Example
//!
//! ```toml
//! executor = "nging"
//! version = "5.2.6"
//! project = "github.com/admpub/nging"
//! build_tags = ["bindata", "sqlite"]
//! copy_files = ["config/ua.txt", "config/preupgrade.*"]
//! make_dirs = ["public/upload"]
//! compiler = "xgo"
//!
//! [vendor_misc_dirs]
//! "*" = ["vendor/github.com/nging-plugins/dbmanager/template/"]
//! linux = ["vendor/github.com/nging-plugins/firewallmanager/template/"]
//! "!linux" = []
//!
//! [targets]
//! linux_riscv64 = "linux/riscv64"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{hints, BuilderError};

/// Config file used when `--conf` is not given
pub const DEFAULT_CONFIG_FILE: &str = "./builder.toml";

/// Compiler driving the per-target build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compiler {
    /// Native `go build`
    Go,
    /// Docker-based cross compiler
    #[default]
    Xgo,
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compiler::Go => write!(f, "go"),
            Compiler::Xgo => write!(f, "xgo"),
        }
    }
}

/// Tag rewrite applied when a target falls back from xgo to the native compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSubstitution {
    /// Configured tag that triggers the rule
    pub when: String,
    /// Pure-Go tag added instead
    pub add: String,
    /// Tags that need native bindings and are dropped
    #[serde(default)]
    pub remove: Vec<String>,
}

/// Which targets the cross compiler can handle, and how tags change when it can't
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossCompilerPolicy {
    pub platforms: Vec<String>,
    pub architectures: Vec<String>,
    #[serde(default)]
    pub fallback_tags: Vec<TagSubstitution>,
}

impl Default for CrossCompilerPolicy {
    fn default() -> Self {
        Self {
            platforms: strings(&["darwin", "linux", "windows"]),
            architectures: strings(&[
                "386", "amd64", "arm-5", "arm-6", "arm-7", "arm64", "mips", "mipsle", "mips64",
                "mips64le",
            ]),
            fallback_tags: vec![TagSubstitution {
                when: "sqlite".to_string(),
                add: "sqlitego".to_string(),
                remove: vec!["sqlitecgo".to_string()],
            }],
        }
    }
}

impl CrossCompilerPolicy {
    /// Whether the cross compiler supports an os/arch pair
    pub fn supports(&self, os: &str, arch: &str) -> bool {
        self.platforms.iter().any(|p| p == os) && self.architectures.iter().any(|a| a == arch)
    }
}

/// Effective build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub go_version: String,
    #[serde(default)]
    pub go_image: String,
    #[serde(default)]
    pub go_proxy: String,
    pub executor: String,
    pub version: String,
    pub label: String,
    #[serde(default)]
    pub package: String,
    /// `<path>[@v<version>]` of an optional startup launcher
    #[serde(default)]
    pub startup_package: String,
    /// Go import path of the project
    pub project: String,
    /// Explicit project directory, bypassing the GOPATH lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<PathBuf>,
    #[serde(default)]
    pub build_tags: Vec<String>,
    #[serde(default)]
    pub copy_files: Vec<String>,
    #[serde(default)]
    pub make_dirs: Vec<String>,
    #[serde(default)]
    pub compiler: Compiler,
    #[serde(default)]
    pub cgo_enabled: bool,
    /// OS key (`*`, `linux`, `!linux`) to directories embedded by bindata
    #[serde(default)]
    pub vendor_misc_dirs: BTreeMap<String, Vec<String>>,
    /// Extra target registry entries (`linux_riscv64 = "linux/riscv64"`)
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
    #[serde(default)]
    pub cross_compiler: CrossCompilerPolicy,
}

impl Default for Config {
    fn default() -> Self {
        let plugin_dirs = [
            "caddymanager/template/",
            "collector/template/",
            "collector/public/assets/",
            "dbmanager/template/",
            "dbmanager/public/assets/",
            "ddnsmanager/template/",
            "dlmanager/template/",
            "frpmanager/template/",
            "ftpmanager/template/",
            "servermanager/template/",
            "sshmanager/template/",
            "webauthn/template/",
        ];

        let mut vendor_misc_dirs = BTreeMap::new();
        vendor_misc_dirs.insert(
            "*".to_string(),
            plugin_dirs
                .iter()
                .map(|d| format!("vendor/github.com/nging-plugins/{}", d))
                .collect(),
        );
        vendor_misc_dirs.insert(
            "linux".to_string(),
            vec!["vendor/github.com/nging-plugins/firewallmanager/template/".to_string()],
        );
        vendor_misc_dirs.insert("!linux".to_string(), Vec::new());

        Self {
            go_version: "1.21.6".to_string(),
            go_image: String::new(),
            go_proxy: String::new(),
            executor: "nging".to_string(),
            version: "5.2.6".to_string(),
            label: "stable".to_string(),
            package: String::new(),
            startup_package: String::new(),
            project: "github.com/admpub/nging".to_string(),
            project_path: None,
            build_tags: strings(&["bindata", "sqlite"]),
            copy_files: strings(&[
                "config/ua.txt",
                "config/config.yaml.sample",
                "data/ip2region",
                "config/preupgrade.*",
            ]),
            make_dirs: strings(&["public/upload", "config/vhosts", "data/logs"]),
            compiler: Compiler::Xgo,
            cgo_enabled: false,
            vendor_misc_dirs,
            targets: BTreeMap::new(),
            cross_compiler: CrossCompilerPolicy::default(),
        }
    }
}

/// Contents of a config file; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverlay {
    pub go_version: Option<String>,
    pub go_image: Option<String>,
    pub go_proxy: Option<String>,
    pub executor: Option<String>,
    pub version: Option<String>,
    pub label: Option<String>,
    pub package: Option<String>,
    pub startup_package: Option<String>,
    pub project: Option<String>,
    pub project_path: Option<PathBuf>,
    pub build_tags: Option<Vec<String>>,
    pub copy_files: Option<Vec<String>>,
    pub make_dirs: Option<Vec<String>>,
    pub compiler: Option<Compiler>,
    pub cgo_enabled: Option<bool>,
    pub vendor_misc_dirs: Option<BTreeMap<String, Vec<String>>>,
    pub targets: Option<BTreeMap<String, String>>,
    pub cross_compiler: Option<CrossCompilerPolicy>,
}

impl ConfigOverlay {
    /// Parse an overlay from TOML
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            BuilderError::config_error_with_hint(
                format!("Failed to parse builder config: {}", e),
                None,
                hints::invalid_config(),
            )
            .into()
        })
    }

    /// Load an overlay from a file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BuilderError::config_error_with_hint(
                format!("Failed to read {}: {}", path.display(), e),
                Some(e.into()),
                hints::config_not_found(),
            )
        })?;

        Self::parse(&content)
    }
}

impl Config {
    /// Defaults overlaid with the given config file, then validated
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let overlay = ConfigOverlay::load_from_path(path)?;
        let mut config = Self::default();
        config.apply(overlay);
        super::validation::validate_config(&config)?;
        Ok(config)
    }

    /// Overlay a config file onto this configuration.
    ///
    /// Names and versions only override when non-empty, `targets` merges
    /// into the existing table, everything else replaces the default.
    pub fn apply(&mut self, overlay: ConfigOverlay) {
        replace_if_set(&mut self.go_version, overlay.go_version);
        replace_if_set(&mut self.executor, overlay.executor);
        replace_if_set(&mut self.version, overlay.version);
        replace_if_set(&mut self.label, overlay.label);
        replace_if_set(&mut self.project, overlay.project);

        if let Some(dirs) = overlay.vendor_misc_dirs.filter(|d| !d.is_empty()) {
            self.vendor_misc_dirs = dirs;
        }
        if let Some(targets) = overlay.targets {
            self.targets.extend(targets);
        }

        self.go_image = overlay.go_image.unwrap_or_default();
        self.go_proxy = overlay.go_proxy.unwrap_or_default();
        self.package = overlay.package.unwrap_or_default();
        self.startup_package = overlay.startup_package.unwrap_or_default();
        self.project_path = overlay.project_path;
        self.build_tags = overlay.build_tags.unwrap_or_default();
        self.copy_files = overlay.copy_files.unwrap_or_default();
        self.make_dirs = overlay.make_dirs.unwrap_or_default();
        self.compiler = overlay.compiler.unwrap_or_default();
        self.cgo_enabled = overlay.cgo_enabled.unwrap_or(false);
        if let Some(policy) = overlay.cross_compiler {
            self.cross_compiler = policy;
        }
    }

    /// Serialize as TOML (used by `genConfig`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize builder config")
    }

    /// Whether the build produces a bare binary with nothing to package
    pub fn is_single_file(&self) -> bool {
        self.copy_files.is_empty()
            && self.make_dirs.is_empty()
            && self.vendor_misc_dirs.values().all(Vec::is_empty)
    }

    /// Directories listed under the `*` key
    pub fn shared_misc_dirs(&self) -> &[String] {
        self.vendor_misc_dirs
            .get("*")
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn replace_if_set(field: &mut String, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *field = value;
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let overlay = ConfigOverlay::parse(
            r#"
executor = "myapp"
project = "github.com/acme/myapp"
"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply(overlay);

        assert_eq!(config.executor, "myapp");
        assert_eq!(config.project, "github.com/acme/myapp");
        // untouched names keep their defaults
        assert_eq!(config.go_version, "1.21.6");
        assert_eq!(config.label, "stable");
        // lists replace the defaults even when absent
        assert!(config.build_tags.is_empty());
        assert!(config.copy_files.is_empty());
        assert_eq!(config.compiler, Compiler::Xgo);
        assert!(!config.cgo_enabled);
    }

    #[test]
    fn test_empty_strings_do_not_override() {
        let overlay = ConfigOverlay::parse(
            r#"
executor = ""
version = ""
"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply(overlay);
        assert_eq!(config.executor, "nging");
        assert_eq!(config.version, "5.2.6");
    }

    #[test]
    fn test_parse_full_config() {
        let overlay = ConfigOverlay::parse(
            r#"
go_version = "1.22.1"
go_image = "ghcr.io/acme/xgo"
executor = "app"
startup_package = "./cmd/startup@v1.2.0"
build_tags = ["bindata", "sqlite", "sqlitecgo"]
copy_files = ["config/*.sample"]
make_dirs = ["data/logs"]
compiler = "go"
cgo_enabled = true

[vendor_misc_dirs]
"*" = ["vendor/github.com/acme/plugin/template/"]
darwin = []

[targets]
linux_riscv64 = "linux/riscv64"

[cross_compiler]
platforms = ["linux"]
architectures = ["amd64"]
"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply(overlay);

        assert_eq!(config.go_image, "ghcr.io/acme/xgo");
        assert_eq!(config.compiler, Compiler::Go);
        assert!(config.cgo_enabled);
        assert_eq!(config.startup_package, "./cmd/startup@v1.2.0");
        assert_eq!(config.vendor_misc_dirs.len(), 2);
        assert_eq!(config.targets["linux_riscv64"], "linux/riscv64");
        assert!(config.cross_compiler.fallback_tags.is_empty());
        assert!(config.cross_compiler.supports("linux", "amd64"));
        assert!(!config.cross_compiler.supports("darwin", "amd64"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ConfigOverlay::parse("exectuor = \"typo\"").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuilderError>(),
            Some(BuilderError::Config { .. })
        ));
    }

    #[test]
    fn test_invalid_compiler_rejected() {
        assert!(ConfigOverlay::parse("compiler = \"gccgo\"").is_err());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let overlay = ConfigOverlay::parse(&text).unwrap();

        let mut reloaded = Config::default();
        reloaded.apply(overlay);
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_single_file_mode() {
        let mut config = Config::default();
        assert!(!config.is_single_file());

        config.copy_files.clear();
        config.make_dirs.clear();
        assert!(!config.is_single_file());

        for dirs in config.vendor_misc_dirs.values_mut() {
            dirs.clear();
        }
        assert!(config.is_single_file());

        config.vendor_misc_dirs.clear();
        assert!(config.is_single_file());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = Config::load_from_path(temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuilderError>(),
            Some(BuilderError::Config { hint: Some(_), .. })
        ));
    }

    #[test]
    fn test_default_policy_table() {
        let policy = CrossCompilerPolicy::default();
        assert!(policy.supports("linux", "arm-7"));
        assert!(policy.supports("windows", "386"));
        assert!(!policy.supports("freebsd", "amd64"));
        assert!(!policy.supports("linux", "riscv64"));
        assert_eq!(policy.fallback_tags[0].add, "sqlitego");
    }
}
