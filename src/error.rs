//! Error types and helpers for user-friendly error messages
//!
//! Every failure in gobuilder is fatal. These variants carry enough context
//! (and an optional hint) for `main` to print something actionable before
//! exiting with status 1.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Steps a target goes through in the build driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Generate,
    Compile,
    Startup,
    Normalize,
    Package,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Generate => write!(f, "go generate"),
            Step::Compile => write!(f, "compile"),
            Step::Startup => write!(f, "startup compile"),
            Step::Normalize => write!(f, "normalize"),
            Step::Package => write!(f, "package"),
        }
    }
}

/// Custom error types with helpful context and suggestions
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Configuration file errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        hint: Option<String>,
    },

    /// Malformed positional arguments
    #[error("Invalid parameter: {message}")]
    InvalidArguments { message: String },

    /// The requested target list resolved to nothing
    #[error("Unsupported target {input:?}")]
    UnsupportedTarget { input: String, known: Vec<String> },

    /// The project source directory could not be located
    #[error("Project {project} not found")]
    ProjectNotFound {
        project: String,
        searched: Vec<PathBuf>,
        hint: String,
    },

    /// Tool/executable not found
    #[error("Missing tool: {tool}")]
    MissingTool {
        tool: String,
        required_for: String,
        hint: String,
    },

    /// An external step exited unsuccessfully
    #[error("{step} failed for {target}: {message}")]
    StepFailed {
        target: String,
        step: Step,
        message: String,
    },
}

impl BuilderError {
    /// Create a configuration error with source and hint
    pub fn config_error_with_hint(
        message: impl Into<String>,
        source: Option<anyhow::Error>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source,
            hint: Some(hint.into()),
        }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn unsupported_target(input: impl Into<String>, known: Vec<String>) -> Self {
        Self::UnsupportedTarget {
            input: input.into(),
            known,
        }
    }

    /// Create a missing tool error
    pub fn missing_tool(
        tool: impl Into<String>,
        required_for: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            required_for: required_for.into(),
            hint: hint.into(),
        }
    }

    pub fn step_failed(target: impl Into<String>, step: Step, message: impl Into<String>) -> Self {
        Self::StepFailed {
            target: target.into(),
            step,
            message: message.into(),
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        match self {
            BuilderError::Config { hint, .. } => {
                if let Some(h) = hint {
                    eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
                }
            }
            BuilderError::MissingTool {
                hint, required_for, ..
            } => {
                eprintln!("  (required for {})", required_for);
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
            }
            BuilderError::ProjectNotFound { searched, hint, .. } => {
                if !searched.is_empty() {
                    eprintln!("\n{}", style("SEARCHED:").cyan().bold());
                    for path in searched {
                        eprintln!("  • {}", path.display());
                    }
                }
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
            }
            BuilderError::UnsupportedTarget { known, .. } => {
                if !known.is_empty() {
                    eprintln!("\n{}", style("KNOWN TARGETS:").cyan().bold());
                    for name in known {
                        eprintln!("  • {}", name);
                    }
                }
            }
            BuilderError::InvalidArguments { .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hints::usage());
            }
            BuilderError::StepFailed { .. } => {}
        }

        eprintln!();
    }
}

/// Common error hints
pub mod hints {
    pub fn usage() -> &'static str {
        "Command format: gobuilder [os_arch[,os_arch...]] [min]\n\
         • gobuilder                  build every registered target\n\
         • gobuilder min              build every target with stripped symbols\n\
         • gobuilder linux_arm64 min  build one target with stripped symbols"
    }

    /// Hint for a missing Go toolchain
    pub fn go() -> &'static str {
        "Install Go from https://go.dev/dl/ or use your package manager:\n\
         • macOS: brew install go\n\
         • Ubuntu: sudo apt install golang-go\n\
         • Windows: winget install GoLang.Go"
    }

    /// Hint for a missing xgo binary
    pub fn xgo() -> &'static str {
        "Install xgo and make sure Docker is running:\n\
         • go install src.techknowlogick.com/xgo@latest\n\
         \n\
         Or set compiler = \"go\" in the builder config to build natively."
    }

    pub fn git() -> &'static str {
        "Install Git from https://git-scm.com/ or use your package manager:\n\
         • macOS: brew install git\n\
         • Ubuntu: sudo apt install git\n\
         • Windows: winget install Git.Git"
    }

    /// Hint for a missing config file
    pub fn config_not_found() -> &'static str {
        "Could not read the builder config file.\n\
         \n\
         To create one with the default settings:\n\
         • Run: gobuilder genConfig\n\
         • Or pass an existing file with --conf <path>"
    }

    pub fn invalid_config() -> &'static str {
        "The builder config is invalid. Common issues:\n\
         • Invalid TOML syntax (check quotes, brackets, commas)\n\
         • compiler must be \"go\" or \"xgo\"\n\
         • targets entries must look like linux_amd64 = \"linux/amd64\""
    }

    pub fn project_not_found() -> &'static str {
        "The project is looked up as <GOPATH>/src/<project>.\n\
         • Check the project import path in the builder config\n\
         • Set GOPATH to the workspace that contains it\n\
         • Or set project_path to the project directory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_target_names_input() {
        let err = BuilderError::unsupported_target("freebsd_amd64", vec![]);
        assert_eq!(err.to_string(), "Unsupported target \"freebsd_amd64\"");
    }

    #[test]
    fn test_step_failed_message() {
        let err = BuilderError::step_failed("linux/amd64", Step::Compile, "exit status 2");
        assert_eq!(err.to_string(), "compile failed for linux/amd64: exit status 2");
    }

    #[test]
    fn test_config_error_keeps_hint() {
        let err = BuilderError::config_error_with_hint("bad", None, hints::invalid_config());
        match err {
            BuilderError::Config { hint, .. } => assert!(hint.is_some()),
            _ => panic!("expected config error"),
        }
    }
}
