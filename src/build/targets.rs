//! Target registry and selection
//!
//! Targets are addressed either by short name (`linux_arm7`) or by their
//! canonical `os/arch` form (`linux/arm-7`). The architecture is free-form;
//! only the `arm` family is special-cased, to recover the `GOARM` revision.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::error::BuilderError;

/// Built-in targets; `freebsd/amd64` is left out because xgo cannot build it
const BUILTIN_TARGETS: &[(&str, &str)] = &[
    ("linux_386", "linux/386"),
    ("linux_amd64", "linux/amd64"),
    ("linux_arm5", "linux/arm-5"),
    ("linux_arm6", "linux/arm-6"),
    ("linux_arm7", "linux/arm-7"),
    ("linux_arm64", "linux/arm64"),
    ("darwin_amd64", "darwin/amd64"),
    ("darwin_arm64", "darwin/arm64"),
    ("windows_386", "windows/386"),
    ("windows_amd64", "windows/amd64"),
];

/// An (operating system, architecture) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target {
    os: String,
    arch: String,
}

impl Target {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    /// Architecture as written, e.g. `arm-7`
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// ARM revision from an `arm-<rev>` architecture
    pub fn arm_revision(&self) -> Option<&str> {
        match self.arch.split_once('-') {
            Some(("arm", rev)) if !rev.is_empty() => Some(rev),
            _ => None,
        }
    }

    /// ARM targets cross-compile slowest and are built last
    pub fn is_arm(&self) -> bool {
        self.arch.starts_with("arm")
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    pub fn is_darwin(&self) -> bool {
        self.os == "darwin"
    }

    /// `GOOS`, `GOARCH` and, for `arm-<rev>`, `GOARM`
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut env = vec![("GOOS".to_string(), self.os.clone())];
        match self.arm_revision() {
            Some(rev) => {
                env.push(("GOARCH".to_string(), "arm".to_string()));
                env.push(("GOARM".to_string(), rev.to_string()));
            }
            None => env.push(("GOARCH".to_string(), self.arch.clone())),
        }
        env
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

impl FromStr for Target {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((os, arch)) if !os.is_empty() && !arch.is_empty() => Ok(Self::new(os, arch)),
            _ => bail!("Invalid target '{}': expected <os>/<arch>", s),
        }
    }
}

/// Short target names mapped to canonical `os/arch` strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRegistry {
    entries: BTreeMap<String, String>,
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TargetRegistry {
    /// Registry with the built-in targets only
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_TARGETS
                .iter()
                .map(|(name, canonical)| (name.to_string(), canonical.to_string()))
                .collect(),
        }
    }

    /// Built-in targets extended by the config's `targets` table
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::builtin();
        registry.extend(
            config
                .targets
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        registry
    }

    /// Add or override entries
    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.entries.extend(entries);
    }

    /// Resolve a short name or a canonical target string
    pub fn resolve(&self, name: &str) -> Option<Target> {
        let canonical = match self.entries.get(name) {
            Some(canonical) => canonical.as_str(),
            None => self.entries.values().find(|v| v.as_str() == name)?.as_str(),
        };
        canonical.parse().ok()
    }

    /// Short name registered for a canonical target
    pub fn name_of(&self, target: &Target) -> Option<&str> {
        let canonical = target.to_string();
        self.entries
            .iter()
            .find(|(_, v)| **v == canonical)
            .map(|(k, _)| k.as_str())
    }

    /// Every registered target, in name order, without duplicates
    pub fn all(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = Vec::with_capacity(self.entries.len());
        for canonical in self.entries.values() {
            if let Ok(target) = canonical.parse::<Target>() {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        targets
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Turn the requested target list into the ordered build list.
///
/// `None` selects every registered target. A comma-separated request drops
/// names that don't resolve and fails only when nothing resolves. Non-ARM
/// targets come first, and no target appears twice.
pub fn select_targets(registry: &TargetRegistry, requested: Option<&str>) -> Result<Vec<Target>> {
    let resolved = match requested {
        None => registry.all(),
        Some(list) => {
            let resolved: Vec<Target> = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .filter_map(|name| registry.resolve(name))
                .collect();
            if resolved.is_empty() {
                return Err(BuilderError::unsupported_target(list, registry.names()).into());
            }
            resolved
        }
    };

    Ok(order_targets(resolved))
}

/// Non-ARM first, then ARM; duplicates removed, order otherwise kept
fn order_targets(targets: Vec<Target>) -> Vec<Target> {
    let mut regular: Vec<Target> = Vec::new();
    let mut arm: Vec<Target> = Vec::new();

    for target in targets {
        let group = if target.is_arm() { &mut arm } else { &mut regular };
        if !group.contains(&target) {
            group.push(target);
        }
    }

    regular.extend(arm);
    regular
}
