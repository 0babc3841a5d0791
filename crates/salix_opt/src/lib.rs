//! Netlist optimization passes for the Salix toolkit.
//!
//! The entry point is [`optimize`], which runs the configured passes over
//! every selected module of a [`Design`], one module at a time. Modules
//! that still contain unresolved behavioral processes are skipped with a
//! warning; they are not errors.
//!
//! # Usage
//!
//! ```ignore
//! use salix_opt::optimize;
//! let summary = optimize(&mut design, &interner, &config.opt, &sink);
//! ```

#![warn(missing_docs)]

mod muxtree;
mod pass;

pub use muxtree::{prune_mux_trees, MuxtreePass};
pub use pass::OptPass;

use salix_common::{Ident, Interner};
use salix_config::OptConfig;
use salix_diagnostics::{Diagnostic, DiagnosticSink};
use salix_ir::{Design, ModuleId};
use std::collections::HashSet;

/// Diagnostic codes emitted by the optimizer.
pub mod codes {
    use salix_diagnostics::{Category, DiagnosticCode};

    /// A module was skipped because it contains unresolved processes.
    pub const MODULE_SKIPPED: DiagnosticCode = DiagnosticCode {
        category: Category::Warning,
        number: 101,
    };

    /// A configured pass name does not match any known pass.
    pub const UNKNOWN_PASS: DiagnosticCode = DiagnosticCode {
        category: Category::Warning,
        number: 102,
    };

    /// A mux was identified as the root of a mux tree.
    pub const TREE_ROOT: DiagnosticCode = DiagnosticCode {
        category: Category::Opt,
        number: 201,
    };

    /// A mux port was found dead and removed.
    pub const DEAD_PORT: DiagnosticCode = DiagnosticCode {
        category: Category::Opt,
        number: 202,
    };

    /// Known-constant input bits were substituted on a mux data port.
    pub const KNOWN_BITS_REPLACED: DiagnosticCode = DiagnosticCode {
        category: Category::Opt,
        number: 203,
    };

    /// Final removed-port count for the whole design.
    pub const REMOVED_PORTS: DiagnosticCode = DiagnosticCode {
        category: Category::Opt,
        number: 204,
    };
}

/// What [`optimize`] did to a design.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptSummary {
    /// Total multiplexer ports removed across all modules.
    pub removed_ports: usize,
    /// Modules the passes ran on.
    pub modules_processed: usize,
    /// Modules skipped because they contain unresolved processes.
    pub modules_skipped: usize,
}

/// Runs the configured optimization passes over every selected module.
///
/// Modules are processed in sequence; all mutable state is private to the
/// per-module pass run. If any port was removed, the design scratchpad
/// flag `opt.did_something` is raised. The final removed-port count is
/// reported through the sink.
pub fn optimize(
    design: &mut Design,
    interner: &Interner,
    config: &OptConfig,
    sink: &DiagnosticSink,
) -> OptSummary {
    let mut summary = OptSummary::default();
    let passes = configured_passes(config, sink);

    let selected: Option<HashSet<Ident>> = config.modules.as_ref().map(|names| {
        names
            .iter()
            .map(|name| interner.get_or_intern(name))
            .collect()
    });

    let module_ids: Vec<ModuleId> = design.modules.iter().map(|(id, _)| id).collect();
    for module_id in module_ids {
        let module = design.modules.get_mut(module_id);

        if let Some(selected) = &selected {
            if !selected.contains(&module.name) {
                continue;
            }
        }

        if module.has_processes() {
            sink.emit(Diagnostic::warning(
                codes::MODULE_SKIPPED,
                format!(
                    "skipping module `{}`: it contains unresolved processes",
                    interner.resolve(module.name)
                ),
            ));
            summary.modules_skipped += 1;
            continue;
        }

        for pass in &passes {
            summary.removed_ports += pass.run(module, interner, sink);
        }
        module.purge_dead_cells();
        summary.modules_processed += 1;
    }

    if summary.removed_ports > 0 {
        design.scratchpad_set_bool("opt.did_something", true);
    }
    sink.emit(Diagnostic::note(
        codes::REMOVED_PORTS,
        format!("removed {} multiplexer ports", summary.removed_ports),
    ));

    summary
}

/// Resolves the configured pass list against the standard passes.
///
/// With no `passes` configuration the full standard list runs in its
/// standard order; otherwise the listed passes run in the listed order,
/// and unknown names are reported and dropped.
fn configured_passes(config: &OptConfig, sink: &DiagnosticSink) -> Vec<Box<dyn OptPass>> {
    let standard = pass::standard_passes();
    let Some(names) = &config.passes else {
        return standard;
    };

    let mut standard: Vec<Option<Box<dyn OptPass>>> = standard.into_iter().map(Some).collect();
    let mut passes = Vec::new();
    for name in names {
        match standard
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|pass| pass.name() == name.as_str()))
        {
            Some(slot) => passes.push(slot.take().unwrap()),
            None => sink.emit(Diagnostic::warning(
                codes::UNKNOWN_PASS,
                format!("unknown pass `{name}` in configuration"),
            )),
        }
    }
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use salix_common::LogicVec;
    use salix_ir::{CellKind, Connection, Module, PortDirection, PortName, SigSpec};

    fn mux_design(interner: &Interner) -> Design {
        let mut design = Design::new();
        let mut module = Module::new(ModuleId::from_raw(0), interner.get_or_intern("top"));
        let a = module.add_wire(interner.get_or_intern("a"), 1);
        let b = module.add_wire(interner.get_or_intern("b"), 1);
        let y = module.add_wire(interner.get_or_intern("y"), 1);
        module.add_port(interner.get_or_intern("y"), PortDirection::Output, y);
        module.add_cell(
            interner.get_or_intern("m0"),
            CellKind::Mux { width: 1 },
            vec![
                Connection {
                    port: PortName::A,
                    signal: SigSpec::from_wire(a, 1),
                },
                Connection {
                    port: PortName::B,
                    signal: SigSpec::from_wire(b, 1),
                },
                Connection {
                    port: PortName::S,
                    signal: SigSpec::from_const(&LogicVec::from_bool(true)),
                },
                Connection {
                    port: PortName::Y,
                    signal: SigSpec::from_wire(y, 1),
                },
            ],
        );
        design.top = Some(design.modules.alloc(module));
        design
    }

    #[test]
    fn optimize_removes_ports_and_raises_flag() {
        let interner = Interner::new();
        let mut design = mux_design(&interner);
        let sink = DiagnosticSink::new();
        let summary = optimize(&mut design, &interner, &OptConfig::default(), &sink);

        assert_eq!(summary.removed_ports, 1);
        assert_eq!(summary.modules_processed, 1);
        assert_eq!(summary.modules_skipped, 0);
        assert!(design.scratchpad_get_bool("opt.did_something"));
        // The collapsed mux is purged, not just marked.
        assert!(design.top_module().unwrap().cells.is_empty());
        assert!(sink
            .diagnostics()
            .iter()
            .any(|diag| diag.code == codes::REMOVED_PORTS
                && diag.message.contains("removed 1 multiplexer ports")));
    }

    #[test]
    fn optimize_reports_zero_when_nothing_changes() {
        let interner = Interner::new();
        let mut design = Design::new();
        design.modules.alloc(Module::new(
            ModuleId::from_raw(0),
            interner.get_or_intern("empty"),
        ));
        let sink = DiagnosticSink::new();
        let summary = optimize(&mut design, &interner, &OptConfig::default(), &sink);

        assert_eq!(summary.removed_ports, 0);
        assert!(!design.scratchpad_get_bool("opt.did_something"));
        assert!(sink
            .diagnostics()
            .iter()
            .any(|diag| diag.code == codes::REMOVED_PORTS));
    }

    #[test]
    fn modules_with_processes_are_skipped() {
        let interner = Interner::new();
        let mut design = mux_design(&interner);
        let top = design.top.unwrap();
        design
            .modules
            .get_mut(top)
            .add_process(interner.get_or_intern("proc0"));

        let sink = DiagnosticSink::new();
        let summary = optimize(&mut design, &interner, &OptConfig::default(), &sink);

        assert_eq!(summary.removed_ports, 0);
        assert_eq!(summary.modules_skipped, 1);
        // The module is untouched.
        assert_eq!(design.top_module().unwrap().cells.len(), 1);
        assert!(sink
            .diagnostics()
            .iter()
            .any(|diag| diag.code == codes::MODULE_SKIPPED));
    }

    #[test]
    fn unselected_modules_are_untouched() {
        let interner = Interner::new();
        let mut design = mux_design(&interner);
        let config = OptConfig {
            modules: Some(vec!["other".to_string()]),
            passes: None,
        };
        let sink = DiagnosticSink::new();
        let summary = optimize(&mut design, &interner, &config, &sink);

        assert_eq!(summary.removed_ports, 0);
        assert_eq!(summary.modules_processed, 0);
        assert_eq!(design.top_module().unwrap().cells.len(), 1);
    }

    #[test]
    fn selected_module_by_name_is_processed() {
        let interner = Interner::new();
        let mut design = mux_design(&interner);
        let config = OptConfig {
            modules: Some(vec!["top".to_string()]),
            passes: None,
        };
        let sink = DiagnosticSink::new();
        let summary = optimize(&mut design, &interner, &config, &sink);
        assert_eq!(summary.removed_ports, 1);
        assert_eq!(summary.modules_processed, 1);
    }

    #[test]
    fn unknown_pass_name_warns_and_is_dropped() {
        let interner = Interner::new();
        let mut design = mux_design(&interner);
        let config = OptConfig {
            modules: None,
            passes: Some(vec!["nonexistent".to_string()]),
        };
        let sink = DiagnosticSink::new();
        let summary = optimize(&mut design, &interner, &config, &sink);

        assert_eq!(summary.removed_ports, 0);
        assert!(sink
            .diagnostics()
            .iter()
            .any(|diag| diag.code == codes::UNKNOWN_PASS));
    }

    #[test]
    fn explicit_pass_selection_runs() {
        let interner = Interner::new();
        let mut design = mux_design(&interner);
        let config = OptConfig {
            modules: None,
            passes: Some(vec!["muxtree".to_string()]),
        };
        let sink = DiagnosticSink::new();
        let summary = optimize(&mut design, &interner, &config, &sink);
        assert_eq!(summary.removed_ports, 1);
    }

    #[test]
    fn optimize_is_idempotent() {
        let interner = Interner::new();
        let mut design = mux_design(&interner);
        let sink = DiagnosticSink::new();
        let first = optimize(&mut design, &interner, &OptConfig::default(), &sink);
        let second = optimize(&mut design, &interner, &OptConfig::default(), &sink);
        assert_eq!(first.removed_ports, 1);
        assert_eq!(second.removed_ports, 0);
    }
}
