//! Compiler invocations
//!
//! Each toolchain turns a `BuildParam` into the exact process the driver
//! runs. Nothing here spawns processes.

use std::path::{Component, Path};

use super::params::BuildParam;
use crate::config::{Compiler, Config};
use crate::exec::subprocess::Invocation;

/// Module proxy handed to xgo when none is configured
pub const DEFAULT_GO_PROXY: &str = "https://goproxy.cn,direct";

/// Image repository used when `go_image` is empty
pub const DEFAULT_XGO_IMAGE: &str = "admpub/xgo";

/// Startup launcher version when `startup_package` carries none
pub const DEFAULT_STARTUP_VERSION: &str = "0.0.1";

/// A compiler able to build one target
pub trait Toolchain {
    /// Program name looked up in PATH
    fn program(&self) -> &'static str;

    /// The compile invocation for a target
    fn build_invocation(&self, param: &BuildParam) -> Invocation;
}

/// Native `go build`
pub struct GoToolchain;

impl Toolchain for GoToolchain {
    fn program(&self) -> &'static str {
        "go"
    }

    fn build_invocation(&self, param: &BuildParam) -> Invocation {
        let ctx = param.ctx;
        let cgo = if ctx.config.cgo_enabled { "1" } else { "0" };

        Invocation::new(self.program())
            .arg("build")
            .args(["-tags".to_string(), param.tags().to_arg()])
            .args(["-ldflags".to_string(), param.ldflags.render()])
            .args([
                "-o".to_string(),
                param.artifact_path().display().to_string(),
            ])
            .current_dir(&ctx.project_path)
            .envs(param.env_vars())
            .env("CGO_ENABLED", cgo)
    }
}

/// Docker-based `xgo` cross compiler
pub struct XgoToolchain;

impl Toolchain for XgoToolchain {
    fn program(&self) -> &'static str {
        "xgo"
    }

    fn build_invocation(&self, param: &BuildParam) -> Invocation {
        let ctx = param.ctx;
        let config = &ctx.config;
        let proxy = if config.go_proxy.is_empty() {
            DEFAULT_GO_PROXY
        } else {
            config.go_proxy.as_str()
        };

        Invocation::new(self.program())
            .args(["-go", config.go_version.as_str()])
            .args(["-goproxy", proxy])
            .args(["-image".to_string(), xgo_image(config)])
            .args(["-targets".to_string(), param.target.to_string()])
            .args([
                "-dest".to_string(),
                param.release_dir.display().to_string(),
            ])
            .args(["-out", param.executor()])
            .args(["-tags".to_string(), param.tags().to_arg()])
            .args(["-ldflags".to_string(), param.ldflags.render()])
            .arg(package_arg(&ctx.work_dir, &ctx.project_path))
            .current_dir(&ctx.work_dir)
    }
}

/// Toolchain for a compiler choice
pub fn toolchain_for(compiler: Compiler) -> Box<dyn Toolchain> {
    match compiler {
        Compiler::Go => Box::new(GoToolchain),
        Compiler::Xgo => Box::new(XgoToolchain),
    }
}

/// `go generate` in the project directory with the target's environment
pub fn generate_invocation(param: &BuildParam) -> Invocation {
    Invocation::new("go")
        .arg("generate")
        .current_dir(&param.ctx.project_path)
        .envs(param.env_vars())
}

/// Build of the startup launcher, when one is configured
pub fn startup_invocation(param: &BuildParam) -> Option<Invocation> {
    let (path, version) = parse_startup_package(&param.ctx.config.startup_package)?;
    // targets share the dist dir in single-file mode
    let name = if param.ctx.single_file {
        format!("startup-{}-{}{}", param.target.os(), param.target.arch(), param.extension)
    } else {
        format!("startup{}", param.extension)
    };
    let output = param.release_dir.join(name);

    Some(
        Invocation::new("go")
            .arg("build")
            .args([
                "-ldflags".to_string(),
                param.startup_ldflags(&version).render(),
            ])
            .args(["-o".to_string(), output.display().to_string()])
            .current_dir(param.ctx.project_path.join(path))
            .envs(param.env_vars()),
    )
}

/// Split `<path>[@v<version>]`; the version defaults to `DEFAULT_STARTUP_VERSION`
pub fn parse_startup_package(value: &str) -> Option<(String, String)> {
    if value.is_empty() {
        return None;
    }
    let (path, version) = match value.split_once('@') {
        Some((path, version)) => (path, version.strip_prefix('v').unwrap_or(version)),
        None => (value, ""),
    };
    let version = if version.is_empty() {
        DEFAULT_STARTUP_VERSION
    } else {
        version
    };
    Some((path.to_string(), version.to_string()))
}

/// xgo image; the Go version is appended as tag unless the image names one
pub fn xgo_image(config: &Config) -> String {
    if config.go_image.is_empty() {
        return format!("{}:{}", DEFAULT_XGO_IMAGE, config.go_version);
    }
    let name = config
        .go_image
        .rsplit('/')
        .next()
        .unwrap_or(&config.go_image);
    if name.contains(':') {
        config.go_image.clone()
    } else {
        format!("{}:{}", config.go_image, config.go_version)
    }
}

/// Package argument for xgo: the project relative to the work dir, `./`-prefixed
fn package_arg(work_dir: &Path, project_path: &Path) -> String {
    let relative = project_path.strip_prefix(work_dir).unwrap_or(project_path);
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    format!("./{}", segments.join("/"))
}
