//! `//go:generate` bindata comment files
//!
//! For every OS key in `vendor_misc_dirs` (other than `*`) a
//! `main_<os>.go` file is written into the project with a build constraint
//! and the go-bindata commands embedding that OS's asset directories.
//! Anything from the first `import ` onward in an existing file is kept.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::utils::terminal::{print_field, print_warning};

/// Asset directories of the application itself
const BASE_MISC_DIRS: &[&str] = &["public/assets/", "template/", "config/i18n/"];

const INSTALL_BINDATA: &str = "//go:generate go install github.com/admpub/bindata/v3/go-bindata@latest";

const BINDATA_COMMAND: &str = r#"//go:generate go-bindata -fs -o bindata_assetfs.go -ignore "\\.(git|svn|DS_Store|less|scss|gitkeep)$" -minify "\\.(js|css)$" -tags bindata"#;

/// Normalize directories to `<dir>/...` and collect the repository prefixes
/// to strip from embedded asset names.
///
/// `vendor/<host>/<org>/<repo>/<rest>` yields `vendor/<host>/<org>/<repo>/`;
/// a path with `../` segments yields everything through the last `../`
/// followed by `<host>/<org>/<repo>/`. Prefixes are unique, in first-seen
/// order.
pub fn group_prefixes<S: AsRef<str>>(dirs: &[S]) -> (Vec<String>, Vec<String>) {
    let mut prefixes: Vec<String> = Vec::new();
    let mut normalized = Vec::with_capacity(dirs.len());

    for dir in dirs {
        let dir = normalize_dir(dir.as_ref());
        if let Some(prefix) = repository_prefix(&dir) {
            if !prefixes.contains(&prefix) {
                prefixes.push(prefix);
            }
        }
        normalized.push(dir);
    }

    (prefixes, normalized)
}

/// Append `/...` unless already present
fn normalize_dir(dir: &str) -> String {
    if dir.ends_with("/...") {
        return dir.to_string();
    }
    if dir.ends_with('/') {
        format!("{}...", dir)
    } else {
        format!("{}/...", dir)
    }
}

fn repository_prefix(dir: &str) -> Option<String> {
    if dir.starts_with("vendor/") {
        let parts: Vec<&str> = dir.splitn(5, '/').collect();
        if parts.len() == 5 {
            return Some(format!("{}/", parts[..4].join("/")));
        }
        return None;
    }

    let last = dir.rfind("../")?;
    let (leading, rest) = dir.split_at(last + 3);
    let parts: Vec<&str> = rest.splitn(4, '/').collect();
    if parts.len() == 4 {
        Some(format!("{}{}/", leading, parts[..3].join("/")))
    } else {
        None
    }
}

/// The two go:generate lines for a set of vendor asset directories
pub fn generate_comment<S: AsRef<str>>(vendor_misc_dirs: &[S]) -> String {
    let mut dirs: Vec<String> = BASE_MISC_DIRS.iter().map(|d| d.to_string()).collect();
    dirs.extend(vendor_misc_dirs.iter().map(|d| d.as_ref().to_string()));
    let (prefixes, dirs) = group_prefixes(&dirs);

    format!(
        "{}\n{} -prefix \"{}\" {}",
        INSTALL_BINDATA,
        BINDATA_COMMAND,
        prefixes.join("|"),
        dirs.join(" ")
    )
}

/// `main_linux.go` for `linux`, `main_nonlinux.go` for `!linux`
pub fn file_name_for(os_key: &str) -> String {
    match os_key.strip_prefix('!') {
        Some(os) => format!("main_non{}.go", os),
        None => format!("main_{}.go", os_key),
    }
}

/// Full content of a generated file, preserving the import block onward
pub fn render_file(os_key: &str, dirs: &[String], previous: Option<&str>) -> String {
    let mut content = format!(
        "//go:build {}\n\npackage main\n\n{}\n\n",
        os_key,
        generate_comment(dirs)
    );
    if let Some(old) = previous {
        if let Some(pos) = old.find("import ") {
            content.push_str(&old[pos..]);
        }
    }
    content
}

/// Write one file per OS key into the project directory
pub fn write_generate_files(config: &Config, project_path: &Path) -> Result<Vec<PathBuf>> {
    let shared = config.shared_misc_dirs();
    let mut written = Vec::new();

    for (os_key, os_dirs) in &config.vendor_misc_dirs {
        if os_key == "*" {
            continue;
        }

        let dirs: Vec<String> = shared.iter().chain(os_dirs.iter()).cloned().collect();
        let file_path = project_path.join(file_name_for(os_key));
        print_field("go:generate", file_path.display());

        let previous = match std::fs::read_to_string(&file_path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                print_warning(&format!(
                    "{} does not exist yet, writing it from scratch",
                    file_path.display()
                ));
                None
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", file_path.display()))
            }
        };

        let content = render_file(os_key, &dirs, previous.as_deref());
        std::fs::write(&file_path, content)
            .with_context(|| format!("Failed to write {}", file_path.display()))?;
        written.push(file_path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_vendor_prefix_is_deduplicated() {
        let dirs = [
            "vendor/github.com/nging-plugins/collector/template/",
            "vendor/github.com/nging-plugins/collector/public/assets/",
            "vendor/github.com/nging-plugins/collector/public/js",
            "vendor/github.com/nging-plugins/dbmanager/template/",
        ];
        let (prefixes, normalized) = group_prefixes(&dirs);

        assert_eq!(
            prefixes,
            vec![
                "vendor/github.com/nging-plugins/collector/",
                "vendor/github.com/nging-plugins/dbmanager/",
            ]
        );
        assert_eq!(
            normalized,
            vec![
                "vendor/github.com/nging-plugins/collector/template/...",
                "vendor/github.com/nging-plugins/collector/public/assets/...",
                "vendor/github.com/nging-plugins/collector/public/js/...",
                "vendor/github.com/nging-plugins/dbmanager/template/...",
            ]
        );
    }

    #[test]
    fn test_relative_prefix_keeps_leading_dots() {
        let dirs = ["../../../github.com/admpub/nging/template/..."];
        let (prefixes, normalized) = group_prefixes(&dirs);

        assert_eq!(normalized[0], "../../../github.com/admpub/nging/template/...");
        assert_eq!(prefixes, vec!["../../../github.com/admpub/nging/"]);
    }

    #[test]
    fn test_relative_prefix_single_level() {
        let dirs = [
            "../github.com/acme/plugin/template",
            "../github.com/acme/plugin/public/",
        ];
        let (prefixes, _) = group_prefixes(&dirs);
        assert_eq!(prefixes, vec!["../github.com/acme/plugin/"]);
    }

    #[test]
    fn test_short_paths_have_no_prefix() {
        let dirs = ["template/", "vendor/github.com/acme", "../github.com/acme"];
        let (prefixes, normalized) = group_prefixes(&dirs);

        assert!(prefixes.is_empty());
        assert_eq!(normalized[0], "template/...");
        assert_eq!(normalized[1], "vendor/github.com/acme/...");
    }

    #[test]
    fn test_generate_comment() {
        let comment = generate_comment(&["vendor/github.com/nging-plugins/sshmanager/template/"]);
        let lines: Vec<&str> = comment.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], INSTALL_BINDATA);
        assert!(lines[1].starts_with("//go:generate go-bindata -fs -o bindata_assetfs.go"));
        assert!(lines[1].contains(
            r#"-tags bindata -prefix "vendor/github.com/nging-plugins/sshmanager/" public/assets/... template/... config/i18n/... vendor/"#
        ));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(file_name_for("linux"), "main_linux.go");
        assert_eq!(file_name_for("!linux"), "main_nonlinux.go");
    }

    #[test]
    fn test_render_keeps_import_block() {
        let previous = "//go:build linux\n\npackage main\n\n//go:generate old\n\nimport (\n\t\"fmt\"\n)\n";
        let content = render_file("linux", &[], Some(previous));

        assert!(content.starts_with("//go:build linux\n\npackage main\n\n//go:generate go install"));
        assert!(content.ends_with("import (\n\t\"fmt\"\n)\n"));
        assert!(!content.contains("//go:generate old"));
    }

    #[test]
    fn test_write_generate_files() {
        let project = tempfile::tempdir().unwrap();
        std::fs::write(
            project.path().join("main_linux.go"),
            "package main\n\nimport _ \"embed\"\n",
        )
        .unwrap();

        let mut config = Config::default();
        let mut dirs = BTreeMap::new();
        dirs.insert(
            "*".to_string(),
            vec!["vendor/github.com/acme/shared/template/".to_string()],
        );
        dirs.insert(
            "linux".to_string(),
            vec!["vendor/github.com/acme/firewall/template/".to_string()],
        );
        dirs.insert("!linux".to_string(), Vec::new());
        config.vendor_misc_dirs = dirs;

        let written = write_generate_files(&config, project.path()).unwrap();
        assert_eq!(written.len(), 2);

        let linux = std::fs::read_to_string(project.path().join("main_linux.go")).unwrap();
        assert!(linux.starts_with("//go:build linux\n"));
        assert!(linux.contains("vendor/github.com/acme/shared/|vendor/github.com/acme/firewall/"));
        assert!(linux.ends_with("import _ \"embed\"\n"));

        let nonlinux = std::fs::read_to_string(project.path().join("main_nonlinux.go")).unwrap();
        assert!(nonlinux.starts_with("//go:build !linux\n"));
        assert!(nonlinux.contains("-prefix \"vendor/github.com/acme/shared/\""));
        assert!(!nonlinux.contains("firewall"));
    }
}
