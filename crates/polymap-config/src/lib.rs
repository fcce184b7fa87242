//! Configuration for polymap heightmap runs.
//!
//! Settings persist to disk as `config.ron` and can be overridden from the
//! command line via clap.

mod cli;
mod config;
mod error;

pub use cli::{CliAnchorMode, CliArgs, CliSelectionMode};
pub use config::{Config, DebugConfig, HeightmapConfig, IslandConfig};
pub use error::ConfigError;
