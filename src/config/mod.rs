//! Builder configuration
//!
//! The built-in defaults describe the nging release build. A TOML file
//! (`builder.toml` by default) overlays them; `gobuilder genConfig` writes
//! the defaults out as a starting point.

mod builder_toml;
pub mod validation;

pub use builder_toml::{
    Compiler, Config, DEFAULT_CONFIG_FILE,
};
