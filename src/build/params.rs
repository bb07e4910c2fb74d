//! Per-target build parameters
//!
//! `BuildParam::derive` applies the fixed per-OS rules to a selected target:
//!
//! - the compiler falls back from xgo to `go` for targets outside the
//!   cross-compiler policy table, rewriting tags per its fallback rules
//! - `osusergo` is always set, `netgo` on everything but windows
//! - `-extldflags '-static'` on everything but darwin
//! - windows binaries get the `.exe` extension

use std::ffi::OsString;
use std::path::PathBuf;

use super::targets::Target;
use super::BuildContext;
use crate::config::Compiler;

/// Ordered set of build tags; inserting a present tag is a no-op
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildTags(Vec<String>);

impl BuildTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, returning false if it was already present
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Tags of `self` followed by those of `other` not already present
    pub fn merged(&self, other: &BuildTags) -> BuildTags {
        let mut merged = self.clone();
        merged.extend(other.0.iter().cloned());
        merged
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Value for `-tags`
    pub fn to_arg(&self) -> String {
        self.0.join(" ")
    }
}

impl Extend<String> for BuildTags {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for BuildTags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = BuildTags::new();
        for tag in iter {
            tags.insert(tag);
        }
        tags
    }
}

/// Linker flags: `-X` string variables plus symbol/linking switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkerFlags {
    vars: Vec<(String, String)>,
    /// `-s -w`
    pub strip: bool,
    /// `-extldflags '-static'`
    pub static_external: bool,
}

impl LinkerFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `main.<name>`; setting an existing name replaces its value
    pub fn set_var(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.vars.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.vars.push((name.to_string(), value)),
        }
    }

    #[cfg(test)]
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Switch flags in emission order
    pub fn switches(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.strip {
            flags.extend(["-s", "-w"]);
        }
        if self.static_external {
            flags.extend(["-extldflags", "'-static'"]);
        }
        flags
    }

    /// Value for `-ldflags`
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = self
            .vars
            .iter()
            .map(|(name, value)| format!("-X main.{}={}", name, value))
            .collect();
        parts.extend(self.switches().into_iter().map(String::from));
        parts.join(" ")
    }
}

/// Everything needed to build one target
#[derive(Debug, Clone)]
pub struct BuildParam<'a> {
    pub ctx: &'a BuildContext,
    pub target: Target,
    /// Compiler after the cross-compiler fallback
    pub compiler: Compiler,
    pub release_dir: PathBuf,
    /// `.exe` on windows
    pub extension: &'static str,
    /// Pure-Go variant tags; emitted before `build_tags`
    pub pure_tags: BuildTags,
    /// Configured tags after fallback removals
    pub build_tags: BuildTags,
    pub ldflags: LinkerFlags,
}

impl<'a> BuildParam<'a> {
    /// Derive the parameters for one target
    pub fn derive(ctx: &'a BuildContext, target: &Target) -> Self {
        let config = &ctx.config;
        let policy = &config.cross_compiler;

        let mut compiler = config.compiler;
        let mut pure_tags: BuildTags = ["osusergo"].into_iter().collect();
        let mut build_tags: BuildTags = config.build_tags.iter().cloned().collect();

        if compiler == Compiler::Xgo && !policy.supports(target.os(), target.arch()) {
            compiler = Compiler::Go;
            for rule in &policy.fallback_tags {
                if build_tags.contains(&rule.when) {
                    pure_tags.insert(rule.add.clone());
                    for tag in &rule.remove {
                        build_tags.remove(tag);
                    }
                }
            }
        }

        let mut ldflags = LinkerFlags::new();
        ldflags.set_var("BUILD_OS", target.os());
        ldflags.set_var("BUILD_ARCH", target.arch());
        ldflags.set_var("BUILD_TIME", ctx.build_time.as_str());
        ldflags.set_var("COMMIT", ctx.commit_id.as_str());
        ldflags.set_var("VERSION", config.version.as_str());
        ldflags.set_var("LABEL", config.label.as_str());
        if !config.package.is_empty() {
            ldflags.set_var("PACKAGE", config.package.as_str());
        }
        ldflags.strip = ctx.minify;
        ldflags.static_external = !target.is_darwin();

        let extension = if target.is_windows() {
            ".exe"
        } else {
            pure_tags.insert("netgo");
            ""
        };

        let release_dir = if ctx.single_file {
            ctx.dist_dir.clone()
        } else {
            ctx.dist_dir.join(format!(
                "{}_{}_{}",
                config.executor,
                target.os(),
                target.arch()
            ))
        };

        Self {
            ctx,
            target: target.clone(),
            compiler,
            release_dir,
            extension,
            pure_tags,
            build_tags,
            ldflags,
        }
    }

    pub fn executor(&self) -> &str {
        self.ctx.executor()
    }

    /// All tags passed to the compiler
    pub fn tags(&self) -> BuildTags {
        self.pure_tags.merged(&self.build_tags)
    }

    /// `GOOS`/`GOARCH`/`GOARM` for this target
    pub fn env_vars(&self) -> Vec<(String, String)> {
        self.target.env_vars()
    }

    /// File name the compiler writes: `<executor>-<os>-<arch>`
    pub fn artifact_name(&self) -> String {
        format!(
            "{}-{}-{}",
            self.executor(),
            self.target.os(),
            self.target.arch()
        )
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.release_dir.join(self.artifact_name())
    }

    /// Where the binary ends up after normalization
    pub fn binary_path(&self) -> PathBuf {
        if self.ctx.single_file {
            self.release_dir
                .join(format!("{}{}", self.artifact_name(), self.extension))
        } else {
            self.release_dir
                .join(format!("{}{}", self.executor(), self.extension))
        }
    }

    /// `<release_dir>.tar.gz`
    pub fn archive_path(&self) -> PathBuf {
        let mut path = OsString::from(self.release_dir.as_os_str());
        path.push(".tar.gz");
        PathBuf::from(path)
    }

    /// Linker flags for the startup launcher binary
    pub fn startup_ldflags(&self, version: &str) -> LinkerFlags {
        let mut ldflags = LinkerFlags::new();
        ldflags.set_var("BUILD_OS", self.target.os());
        ldflags.set_var("BUILD_ARCH", self.target.arch());
        ldflags.set_var("BUILD_TIME", self.ctx.build_time.as_str());
        ldflags.set_var("COMMIT", self.ctx.commit_id.as_str());
        ldflags.set_var("VERSION", version);
        let main_exe = self
            .binary_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ldflags.set_var("MAIN_EXE", main_exe);
        ldflags.strip = self.ldflags.strip;
        ldflags.static_external = self.ldflags.static_external;
        ldflags
    }
}
