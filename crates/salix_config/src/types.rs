//! Configuration types deserialized from `salix.toml`.

use serde::Deserialize;

/// The top-level project configuration parsed from `salix.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata (name, input netlist, top module).
    pub project: ProjectMeta,
    /// Optimizer settings.
    #[serde(default)]
    pub opt: OptConfig,
}

/// Core project metadata required in every `salix.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Path to the input netlist JSON.
    pub netlist: String,
    /// Name of the top-level module, if one should be designated.
    #[serde(default)]
    pub top: Option<String>,
}

/// Optimizer settings from the `[opt]` section.
#[derive(Debug, Default, Deserialize)]
pub struct OptConfig {
    /// Names of the modules to process. Absent means all modules.
    /// Modules not listed here are left untouched.
    #[serde(default)]
    pub modules: Option<Vec<String>>,
    /// Names of the passes to run, in order. Absent means the standard
    /// pass list.
    #[serde(default)]
    pub passes: Option<Vec<String>>,
}
