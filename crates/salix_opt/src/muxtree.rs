//! Mux-tree dead-branch elimination.
//!
//! Analyzes the selector signals of the multiplexer trees in a module and
//! identifies input ports that can never be selected. Dead ports are
//! removed: a mux that loses every port disappears, a mux with one
//! surviving port collapses to a direct connection, and anything else is
//! rebuilt with a narrower selector.
//!
//! The analysis builds a bit-granular dataflow model (which muxes read and
//! drive each canonical wire bit), picks the *roots* of the mux trees, and
//! walks each tree from its root carrying a reference-counted knowledge
//! context of selector bits that are known high or low on the current
//! path. The context makes sibling selectors mutually exclusive: while
//! port `p` of a mux is assumed active, every other selector of that mux
//! is assumed low. For a priority mux this understates reality (a
//! lower-priority selector may be high while a higher-priority port wins),
//! which can only over-prune in fan-in regions that are themselves only
//! reachable through the assumed port.

use crate::codes;
use crate::pass::OptPass;
use salix_common::{Interner, Logic};
use salix_diagnostics::{Diagnostic, DiagnosticSink};
use salix_ir::{CellId, CellKind, Module, PortDirection, PortName, SigBit, SigMap, SigSpec};
use std::collections::{HashMap, HashSet};

/// The mux-tree dead-branch elimination pass.
pub struct MuxtreePass;

impl OptPass for MuxtreePass {
    fn name(&self) -> &'static str {
        "muxtree"
    }

    fn run(&self, module: &mut Module, interner: &Interner, sink: &DiagnosticSink) -> usize {
        prune_mux_trees(module, interner, sink)
    }
}

/// Removes never-selected multiplexer ports from one module.
///
/// Returns the number of removed ports. The module is modified in place:
/// dead ports are cut out of their cells, fully dead muxes are marked
/// removed (pending [`Module::purge_dead_cells`]), and muxes reduced to a
/// single live port are replaced by a direct connection.
pub fn prune_mux_trees(module: &mut Module, interner: &Interner, sink: &DiagnosticSink) -> usize {
    let mut worker = MuxtreeWorker::new(module, interner, sink);
    worker.run()
}

/// Per canonical wire bit: who touches it.
#[derive(Default)]
struct BitInfo {
    /// The bit is consumed outside mux-to-mux dataflow: by a non-mux
    /// cell, a module output port, or any mux selector input.
    seen_non_mux: bool,
    /// Muxes that consume this bit on an A or B data port.
    mux_users: Vec<usize>,
    /// Muxes that drive this bit from their Y port.
    mux_drivers: Vec<usize>,
}

/// One port of a multiplexer: `select_width` selectable ports followed by
/// the default port.
struct PortInfo {
    /// The canonical selector bit gating this port. `None` for the
    /// default port and for constant selector bits (which are decided by
    /// the const flags instead).
    ctrl_sig: Option<usize>,
    /// Canonical wire bits feeding this port's data input.
    input_sigs: Vec<usize>,
    /// Muxes whose Y drives any bit in `input_sigs`.
    input_muxes: Vec<usize>,
    /// The selector is constant-1: the port is always chosen when reached.
    const_activated: bool,
    /// The selector is constant-0 (or x/z): the port is never chosen.
    const_deactivated: bool,
    /// Live flag, set by the tree evaluator. Monotone: never reset.
    enabled: bool,
}

struct MuxInfo {
    cell: CellId,
    ports: Vec<PortInfo>,
}

/// Per-root analysis scratchpad.
///
/// The knowledge arrays are reference counters bracketing each recursive
/// descent: every increment on entry to a port evaluation is matched by a
/// decrement on exit, so after a root evaluation returns, all entries are
/// zero again. A bit with both counters non-zero arises only from
/// contradictory assumptions and errs toward liveness.
struct Knowledge {
    known_inactive: Vec<u32>,
    known_active: Vec<u32>,
    visited_muxes: Vec<bool>,
}

impl Knowledge {
    fn new(num_bits: usize, num_muxes: usize) -> Self {
        Self {
            known_inactive: vec![0; num_bits],
            known_active: vec![0; num_bits],
            visited_muxes: vec![false; num_muxes],
        }
    }
}

struct MuxtreeWorker<'a> {
    module: &'a mut Module,
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
    assign_map: SigMap,
    bit_index: HashMap<SigBit, usize>,
    bits: Vec<BitInfo>,
    muxes: Vec<MuxInfo>,
    root_muxes: Vec<bool>,
    removed_count: usize,
}

impl<'a> MuxtreeWorker<'a> {
    fn new(module: &'a mut Module, interner: &'a Interner, sink: &'a DiagnosticSink) -> Self {
        let assign_map = SigMap::from_module(module);
        Self {
            module,
            interner,
            sink,
            assign_map,
            bit_index: HashMap::new(),
            bits: Vec::new(),
            muxes: Vec::new(),
            root_muxes: Vec::new(),
            removed_count: 0,
        }
    }

    fn run(&mut self) -> usize {
        self.build_graph();
        if self.muxes.is_empty() {
            return 0;
        }
        self.link_input_muxes();
        self.find_roots();

        for mux_idx in 0..self.muxes.len() {
            if self.root_muxes[mux_idx] {
                let cell = self.module.cells.get(self.muxes[mux_idx].cell);
                self.sink.emit(
                    Diagnostic::note(codes::TREE_ROOT, "mux tree root").with_note(format!(
                        "{} cell `{}`",
                        cell.kind.name(),
                        self.interner.resolve(cell.name)
                    )),
                );
                self.eval_root_mux(mux_idx);
            }
        }

        self.rewrite();
        self.removed_count
    }

    /// Maps a canonical wire bit to its dense index, interning it on
    /// first observation.
    fn intern_bit(&mut self, bit: SigBit) -> usize {
        if let Some(&idx) = self.bit_index.get(&bit) {
            return idx;
        }
        let idx = self.bits.len();
        self.bit_index.insert(bit, idx);
        self.bits.push(BitInfo::default());
        idx
    }

    /// Canonicalizes a signal and interns its wire bits, dropping
    /// constant bits.
    fn wire_bits(&mut self, sig: &SigSpec) -> Vec<usize> {
        let canon = self.assign_map.canonical(sig);
        let mut out = Vec::with_capacity(canon.width());
        for bit in canon.iter() {
            if let SigBit::Wire { .. } = bit {
                out.push(self.intern_bit(bit));
            }
        }
        out
    }

    /// Canonicalizes a signal and interns its wire bits, keeping constant
    /// bits as `None` so positions line up with the original signal.
    fn all_bits(&mut self, sig: &SigSpec) -> Vec<Option<usize>> {
        let canon = self.assign_map.canonical(sig);
        let mut out = Vec::with_capacity(canon.width());
        for bit in canon.iter() {
            match bit {
                SigBit::Wire { .. } => out.push(Some(self.intern_bit(bit))),
                SigBit::Const(_) => out.push(None),
            }
        }
        out
    }

    /// Single traversal of the module's live cells, populating the bit
    /// and mux tables.
    fn build_graph(&mut self) {
        let cell_ids: Vec<CellId> = self.module.live_cells().map(|(id, _)| id).collect();

        for cell_id in cell_ids {
            let cell = self.module.cells.get(cell_id);
            if cell.kind.is_mux() {
                let sig_a = cell.port(PortName::A).cloned().unwrap_or_default();
                let sig_b = cell.port(PortName::B).cloned().unwrap_or_default();
                let sig_s = cell.port(PortName::S).cloned().unwrap_or_default();
                let sig_y = cell.port(PortName::Y).cloned().unwrap_or_default();

                let mux_idx = self.muxes.len();
                let width = sig_a.width();
                let mut ports = Vec::with_capacity(sig_s.width() + 1);

                for i in 0..sig_s.width() {
                    let sig = sig_b.extract(i * width, width);
                    let ctrl_sig = self.assign_map.canonical(&sig_s.extract(i, 1));
                    let const_value = ctrl_sig.as_bool();
                    let mut port = PortInfo {
                        ctrl_sig: self.all_bits(&ctrl_sig)[0],
                        input_sigs: Vec::new(),
                        input_muxes: Vec::new(),
                        const_activated: const_value == Some(true),
                        const_deactivated: const_value == Some(false),
                        enabled: false,
                    };
                    for idx in self.wire_bits(&sig) {
                        add_to_list(&mut self.bits[idx].mux_users, mux_idx);
                        add_to_list(&mut port.input_sigs, idx);
                    }
                    ports.push(port);
                }

                let mut default_port = PortInfo {
                    ctrl_sig: None,
                    input_sigs: Vec::new(),
                    input_muxes: Vec::new(),
                    const_activated: false,
                    const_deactivated: false,
                    enabled: false,
                };
                for idx in self.wire_bits(&sig_a) {
                    add_to_list(&mut self.bits[idx].mux_users, mux_idx);
                    add_to_list(&mut default_port.input_sigs, idx);
                }
                ports.push(default_port);

                for idx in self.wire_bits(&sig_y) {
                    add_to_list(&mut self.bits[idx].mux_drivers, mux_idx);
                }

                // Selector lines are non-mux consumers for root analysis.
                for idx in self.wire_bits(&sig_s) {
                    self.bits[idx].seen_non_mux = true;
                }

                self.muxes.push(MuxInfo {
                    cell: cell_id,
                    ports,
                });
            } else {
                let sigs: Vec<SigSpec> = cell
                    .connections
                    .iter()
                    .map(|conn| conn.signal.clone())
                    .collect();
                for sig in sigs {
                    for idx in self.wire_bits(&sig) {
                        self.bits[idx].seen_non_mux = true;
                    }
                }
            }
        }

        let output_sigs: Vec<SigSpec> = self
            .module
            .ports
            .iter()
            .filter(|port| port.direction == PortDirection::Output)
            .map(|port| SigSpec::from_wire(port.wire, self.module.wire_width(port.wire)))
            .collect();
        for sig in output_sigs {
            for idx in self.wire_bits(&sig) {
                self.bits[idx].seen_non_mux = true;
            }
        }
    }

    /// Second pass: links every consumer port to the muxes flowing into
    /// its data bits.
    fn link_input_muxes(&mut self) {
        for bit_idx in 0..self.bits.len() {
            for user_pos in 0..self.bits[bit_idx].mux_users.len() {
                let user = self.bits[bit_idx].mux_users[user_pos];
                for port_idx in 0..self.muxes[user].ports.len() {
                    if !self.muxes[user].ports[port_idx].input_sigs.contains(&bit_idx) {
                        continue;
                    }
                    for driver_pos in 0..self.bits[bit_idx].mux_drivers.len() {
                        let driver = self.bits[bit_idx].mux_drivers[driver_pos];
                        add_to_list(&mut self.muxes[user].ports[port_idx].input_muxes, driver);
                    }
                }
            }
        }
    }

    /// Marks the roots of the mux trees: muxes feeding non-mux logic, and
    /// muxes whose output fans out to more than one downstream mux.
    fn find_roots(&mut self) {
        let mut mux_to_users: HashMap<usize, HashSet<usize>> = HashMap::new();
        self.root_muxes = vec![false; self.muxes.len()];

        for bit in &self.bits {
            for &driver in &bit.mux_drivers {
                for &user in &bit.mux_users {
                    mux_to_users.entry(driver).or_default().insert(user);
                }
            }
            if !bit.seen_non_mux {
                continue;
            }
            for &driver in &bit.mux_drivers {
                self.root_muxes[driver] = true;
            }
        }

        for (mux_idx, users) in &mux_to_users {
            if users.len() > 1 {
                self.root_muxes[*mux_idx] = true;
            }
        }
    }

    fn eval_root_mux(&mut self, mux_idx: usize) {
        let mut knowledge = Knowledge::new(self.bits.len(), self.muxes.len());
        knowledge.visited_muxes[mux_idx] = true;
        self.eval_mux(&mut knowledge, mux_idx);
        debug_assert!(knowledge.known_inactive.iter().all(|&count| count == 0));
        debug_assert!(knowledge.known_active.iter().all(|&count| count == 0));
    }

    /// Rewrites bits of the cell's data port that the current context
    /// pins to a known value. This is an in-place netlist edit, visible
    /// to later evaluations and to the rewriter.
    fn replace_known(&mut self, knowledge: &Knowledge, mux_idx: usize, port_name: PortName) {
        let cell_id = self.muxes[mux_idx].cell;
        let Some(sig) = self.module.cells.get(cell_id).port(port_name).cloned() else {
            return;
        };

        let bits = self.all_bits(&sig);
        let mut new_sig = sig.clone();
        let mut did_something = false;
        for (pos, idx) in bits.iter().enumerate() {
            let Some(idx) = *idx else { continue };
            if knowledge.known_inactive[idx] > 0 {
                new_sig.set_bit(pos, SigBit::Const(Logic::Zero));
                did_something = true;
            } else if knowledge.known_active[idx] > 0 {
                new_sig.set_bit(pos, SigBit::Const(Logic::One));
                did_something = true;
            }
        }

        if did_something {
            let cell_name = self
                .interner
                .resolve(self.module.cells.get(cell_id).name)
                .to_string();
            let old_text = self.module.signal_to_string(&sig, self.interner);
            let new_text = self.module.signal_to_string(&new_sig, self.interner);
            self.sink.emit(
                Diagnostic::note(codes::KNOWN_BITS_REPLACED, "replacing known input bits")
                    .with_note(format!(
                        "port {port_name} of cell `{cell_name}`: {old_text} -> {new_text}"
                    )),
            );
            self.module.cells.get_mut(cell_id).set_port(port_name, new_sig);
        }
    }

    /// Evaluates one mux in the current context: substitute known bits,
    /// then decide which of its ports may be live.
    fn eval_mux(&mut self, knowledge: &mut Knowledge, mux_idx: usize) {
        self.replace_known(knowledge, mux_idx, PortName::A);
        self.replace_known(knowledge, mux_idx, PortName::B);

        let ports: Vec<(Option<usize>, bool)> = self.muxes[mux_idx]
            .ports
            .iter()
            .map(|port| (port.ctrl_sig, port.const_activated))
            .collect();
        let num_ports = ports.len();

        // A constant-activated port preempts everything after it in
        // priority order.
        for (port_idx, &(_, const_activated)) in ports.iter().enumerate().take(num_ports - 1) {
            if const_activated {
                self.eval_mux_port(knowledge, mux_idx, port_idx);
                return;
            }
        }

        // A known-active selector preempts as well: no other port of this
        // mux can be selected in this context.
        for (port_idx, &(ctrl_sig, _)) in ports.iter().enumerate().take(num_ports - 1) {
            if let Some(ctrl) = ctrl_sig {
                if knowledge.known_active[ctrl] > 0 {
                    self.eval_mux_port(knowledge, mux_idx, port_idx);
                    return;
                }
            }
        }

        // General sweep, including the default port (which has no
        // selector and therefore no known-inactive check). A port
        // survives if its own selector is not known-inactive and no
        // sibling selector is known-active.
        for port_idx in 0..num_ports {
            if port_idx < num_ports - 1 {
                if let Some(ctrl) = ports[port_idx].0 {
                    if knowledge.known_inactive[ctrl] > 0 {
                        continue;
                    }
                }
            }

            let mut port_active = true;
            for (other_idx, &(ctrl_sig, _)) in ports.iter().enumerate().take(num_ports - 1) {
                if other_idx == port_idx {
                    continue;
                }
                if let Some(ctrl) = ctrl_sig {
                    if knowledge.known_active[ctrl] > 0 {
                        port_active = false;
                    }
                }
            }
            if port_active {
                self.eval_mux_port(knowledge, mux_idx, port_idx);
            }
        }
    }

    /// Enables port `port_idx` of mux `mux_idx` and recursively evaluates
    /// the fan-in muxes reachable through it, under the assumption that
    /// this port is the selected one.
    fn eval_mux_port(&mut self, knowledge: &mut Knowledge, mux_idx: usize, port_idx: usize) {
        let (const_deactivated, const_activated, ctrl_sig) = {
            let port = &self.muxes[mux_idx].ports[port_idx];
            (port.const_deactivated, port.const_activated, port.ctrl_sig)
        };
        if const_deactivated {
            return;
        }

        self.muxes[mux_idx].ports[port_idx].enabled = true;

        let num_ports = self.muxes[mux_idx].ports.len();
        let is_default = port_idx == num_ports - 1;

        // Push context: assuming this port is selected, every sibling
        // selector is low, and this port's own selector is high.
        let sibling_ctrls: Vec<usize> = self.muxes[mux_idx]
            .ports
            .iter()
            .enumerate()
            .filter(|&(other_idx, _)| other_idx != port_idx)
            .filter_map(|(_, port)| port.ctrl_sig)
            .collect();
        for &ctrl in &sibling_ctrls {
            knowledge.known_inactive[ctrl] += 1;
        }
        if !is_default && !const_activated {
            if let Some(ctrl) = ctrl_sig {
                knowledge.known_active[ctrl] += 1;
            }
        }

        // Descend into fan-in muxes not already on the evaluation stack.
        // Roots are not descended: they get their own entry context.
        let mut parent_muxes = Vec::new();
        for fan_in in self.muxes[mux_idx].ports[port_idx].input_muxes.clone() {
            if knowledge.visited_muxes[fan_in] {
                continue;
            }
            knowledge.visited_muxes[fan_in] = true;
            parent_muxes.push(fan_in);
        }
        for &fan_in in &parent_muxes {
            if !self.root_muxes[fan_in] {
                self.eval_mux(knowledge, fan_in);
            }
        }
        for &fan_in in &parent_muxes {
            knowledge.visited_muxes[fan_in] = false;
        }

        // Pop context: reverse the increments exactly.
        if !is_default && !const_activated {
            if let Some(ctrl) = ctrl_sig {
                knowledge.known_active[ctrl] -= 1;
            }
        }
        for &ctrl in &sibling_ctrls {
            knowledge.known_inactive[ctrl] -= 1;
        }
    }

    /// Deletes, collapses, or shrinks every mux according to the liveness
    /// flags snapshotted by evaluation.
    fn rewrite(&mut self) {
        for mux_idx in 0..self.muxes.len() {
            let cell_id = self.muxes[mux_idx].cell;
            let num_ports = self.muxes[mux_idx].ports.len();

            let mut live_ports = Vec::new();
            for port_idx in 0..num_ports {
                if self.muxes[mux_idx].ports[port_idx].enabled {
                    live_ports.push(port_idx);
                } else {
                    let cell = self.module.cells.get(cell_id);
                    self.sink.emit(
                        Diagnostic::note(codes::DEAD_PORT, "dead mux port").with_note(format!(
                            "port {}/{} on {} cell `{}`",
                            port_idx + 1,
                            num_ports,
                            cell.kind.name(),
                            self.interner.resolve(cell.name)
                        )),
                    );
                    self.removed_count += 1;
                }
            }

            if live_ports.len() == num_ports {
                continue;
            }

            if live_ports.is_empty() {
                self.module.remove_cell(cell_id);
                continue;
            }

            let cell = self.module.cells.get(cell_id);
            let sig_a = cell.port(PortName::A).cloned().unwrap_or_default();
            let sig_b = cell.port(PortName::B).cloned().unwrap_or_default();
            let sig_s = cell.port(PortName::S).cloned().unwrap_or_default();
            let sig_y = cell.port(PortName::Y).cloned().unwrap_or_default();
            let width = sig_a.width();

            let mut sig_ports = sig_b;
            sig_ports.append(&sig_a);

            if live_ports.len() == 1 {
                let sig_in = sig_ports.extract(live_ports[0] * width, width);
                self.module.connect(sig_y, sig_in);
                self.module.remove_cell(cell_id);
            } else {
                let mut new_a = SigSpec::new();
                let mut new_b = SigSpec::new();
                let mut new_s = SigSpec::new();

                for (pos, &port_idx) in live_ports.iter().enumerate() {
                    let sig_in = sig_ports.extract(port_idx * width, width);
                    if pos == live_ports.len() - 1 {
                        // The surviving default: the old default if it
                        // lived, otherwise the last live port promoted.
                        new_a = sig_in;
                    } else {
                        new_b.append(&sig_in);
                        new_s.append(&sig_s.extract(port_idx, 1));
                    }
                }

                let new_select_width = new_s.width();
                let cell = self.module.cells.get_mut(cell_id);
                cell.set_port(PortName::A, new_a);
                cell.set_port(PortName::B, new_b);
                cell.set_port(PortName::S, new_s);
                cell.kind = if new_select_width == 1 {
                    CellKind::Mux {
                        width: width as u32,
                    }
                } else {
                    CellKind::Pmux {
                        width: width as u32,
                        select_width: new_select_width as u32,
                    }
                };
            }
        }
    }
}

/// Appends a value to a membership list if not already present.
fn add_to_list(list: &mut Vec<usize>, value: usize) {
    if !list.contains(&value) {
        list.push(value);
    }
}
