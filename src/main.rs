//! GoBuilder - cross-compilation and release packaging for Go applications
//!
//! Builds a Go project for a matrix of OS/arch targets with `xgo` or the
//! native `go` toolchain, stamps build metadata through linker flags and
//! packages each target as a tar.gz with SHA-256 sidecars.
//!
//! ## Architecture
//!
//! ```text
//! CLI → commands/ → build/ (targets → params → driver) → go / xgo
//! ```

mod build;
mod cli;
mod commands;
mod config;
mod error;
mod exec;
mod utils;

use clap::Parser;

use cli::Cli;
use error::BuilderError;
use utils::terminal::print_error;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.execute() {
        match err.downcast_ref::<BuilderError>() {
            Some(builder_err) => builder_err.display_with_hints(),
            None => print_error(&format!("{:#}", err)),
        }
        std::process::exit(1);
    }
}
