//! `genConfig`: write the default builder config

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::utils::paths::ensure_dir;
use crate::utils::terminal::print_success;

pub struct GenConfigCommand {
    pub conf: PathBuf,
}

impl GenConfigCommand {
    /// Overwrites any existing file at the config path
    pub fn execute(self, _verbose: bool) -> Result<()> {
        if let Some(parent) = self.conf.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }

        let content = Config::default().to_toml()?;
        std::fs::write(&self.conf, content)
            .with_context(|| format!("Failed to write {}", self.conf.display()))?;

        print_success(&format!("Generated {}", self.conf.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("nested/builder.toml");
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(&conf, "stale").unwrap();

        GenConfigCommand { conf: conf.clone() }.execute(false).unwrap();

        let loaded = Config::load_from_path(&conf).unwrap();
        assert_eq!(loaded, Config::default());
    }
}
