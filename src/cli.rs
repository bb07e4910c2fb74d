//! CLI argument parsing using clap derive macros
//!
//! Positional usage mirrors the classic builder script:
//!
//! ```text
//! gobuilder                        build every registered target
//! gobuilder min                    ... with stripped symbols
//! gobuilder linux_amd64,linux_arm7 [min]
//! gobuilder genConfig | makeGen | version
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::commands::{
    build::BuildCommand, gen_config::GenConfigCommand, make_gen::MakeGenCommand,
};
use crate::config::DEFAULT_CONFIG_FILE;
use crate::error::BuilderError;

/// Release banner printed for `version` / `--version`
pub fn version_string() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}

/// GoBuilder - cross-compilation and release packaging for Go applications
#[derive(Parser, Debug)]
#[command(name = "gobuilder")]
#[command(author, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Target list (comma-separated) and/or `min`, or one of genConfig, makeGen, version
    pub args: Vec<String>,

    /// Builder config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub conf: PathBuf,

    /// Print the version and exit
    #[arg(long)]
    pub version: bool,

    /// Don't regenerate the go:generate files before building
    #[arg(long)]
    pub nomisc: bool,

    /// Output directory (default: <project>/dist)
    #[arg(long = "outputDir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// What the positional arguments ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    GenConfig,
    MakeGen,
    Version,
    Build {
        targets: Option<String>,
        minify: bool,
    },
}

/// `m` and `min` request minified binaries
pub fn is_minify(token: &str) -> bool {
    matches!(token, "m" | "min")
}

/// Interpret the positional arguments
pub fn parse_request(args: &[String]) -> Result<Request> {
    match args {
        [] => Ok(Request::Build {
            targets: None,
            minify: false,
        }),
        [single] => Ok(match single.as_str() {
            "genConfig" => Request::GenConfig,
            "makeGen" => Request::MakeGen,
            "version" => Request::Version,
            token if is_minify(token) => Request::Build {
                targets: None,
                minify: true,
            },
            targets => Request::Build {
                targets: Some(targets.to_string()),
                minify: false,
            },
        }),
        [targets, flag] => Ok(Request::Build {
            targets: Some(targets.clone()),
            minify: is_minify(flag),
        }),
        _ => Err(BuilderError::invalid_arguments(format!(
            "expected at most 2 arguments, got {}",
            args.len()
        ))
        .into()),
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        if self.version {
            println!("{}", version_string());
            return Ok(());
        }

        match parse_request(&self.args)? {
            Request::Version => {
                println!("{}", version_string());
                Ok(())
            }
            Request::GenConfig => GenConfigCommand { conf: self.conf }.execute(self.verbose),
            Request::MakeGen => MakeGenCommand { conf: self.conf }.execute(self.verbose),
            Request::Build { targets, minify } => BuildCommand {
                conf: self.conf,
                targets,
                minify,
                nomisc: self.nomisc,
                output_dir: self.output_dir,
            }
            .execute(self.verbose),
        }
    }
}
