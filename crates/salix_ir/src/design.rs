//! Top-level design container.
//!
//! A [`Design`] holds all modules plus the scratchpad, a string key-value
//! surface that passes use to leave flags for the driver (for example
//! `opt.did_something` when a pass changed the netlist).

use crate::arena::Arena;
use crate::ids::ModuleId;
use crate::module::Module;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete netlist design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    /// All modules in the design, keyed by [`ModuleId`].
    pub modules: Arena<ModuleId, Module>,
    /// The top-level module, if one is designated.
    pub top: Option<ModuleId>,
    /// Key-value scratchpad shared between passes and the driver.
    #[serde(default)]
    pub scratchpad: BTreeMap<String, String>,
}

impl Design {
    /// Creates a new empty design.
    pub fn new() -> Self {
        Self {
            modules: Arena::new(),
            top: None,
            scratchpad: BTreeMap::new(),
        }
    }

    /// Returns the number of modules in the design.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Returns a reference to the top-level module, if designated.
    pub fn top_module(&self) -> Option<&Module> {
        self.top.map(|id| self.modules.get(id))
    }

    /// Sets a boolean scratchpad entry.
    pub fn scratchpad_set_bool(&mut self, key: &str, value: bool) {
        self.scratchpad
            .insert(key.to_string(), if value { "1" } else { "0" }.to_string());
    }

    /// Reads a boolean scratchpad entry; absent keys read as `false`.
    pub fn scratchpad_get_bool(&self, key: &str) -> bool {
        matches!(self.scratchpad.get(key).map(String::as_str), Some("1") | Some("true"))
    }
}

impl Default for Design {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salix_common::Interner;

    #[test]
    fn empty_design() {
        let design = Design::new();
        assert_eq!(design.module_count(), 0);
        assert!(design.top_module().is_none());
    }

    #[test]
    fn top_module_access() {
        let interner = Interner::new();
        let mut design = Design::new();
        let id = design.modules.alloc(Module::new(
            ModuleId::from_raw(0),
            interner.get_or_intern("top"),
        ));
        design.top = Some(id);
        assert_eq!(design.top_module().unwrap().id, id);
    }

    #[test]
    fn scratchpad_bool_roundtrip() {
        let mut design = Design::new();
        assert!(!design.scratchpad_get_bool("opt.did_something"));
        design.scratchpad_set_bool("opt.did_something", true);
        assert!(design.scratchpad_get_bool("opt.did_something"));
        design.scratchpad_set_bool("opt.did_something", false);
        assert!(!design.scratchpad_get_bool("opt.did_something"));
    }

    #[test]
    fn scratchpad_accepts_textual_true() {
        let mut design = Design::new();
        design
            .scratchpad
            .insert("flag".to_string(), "true".to_string());
        assert!(design.scratchpad_get_bool("flag"));
    }

    #[test]
    fn design_serde_roundtrip() {
        let interner = Interner::new();
        let mut design = Design::new();
        let id = design.modules.alloc(Module::new(
            ModuleId::from_raw(0),
            interner.get_or_intern("top"),
        ));
        design.top = Some(id);
        design.scratchpad_set_bool("opt.did_something", true);
        let json = serde_json::to_string(&design).unwrap();
        let restored: Design = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.module_count(), 1);
        assert_eq!(restored.top, design.top);
        assert!(restored.scratchpad_get_bool("opt.did_something"));
    }
}
