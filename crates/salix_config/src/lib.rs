//! Project configuration for the Salix netlist toolkit.
//!
//! Loads and validates `salix.toml`, which names the input netlist and
//! controls which modules and passes the optimizer runs.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::{OptConfig, ProjectConfig, ProjectMeta};
