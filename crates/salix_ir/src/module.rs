//! Module definitions — the primary organizational unit of the netlist.
//!
//! A [`Module`] contains ports, wires, cells, module-level connections
//! (direct assignments), and any unresolved behavioral [`Process`]es left
//! over from the frontend. Optimization passes mutate one module at a
//! time; cell removal is a dead-set mark followed by an explicit
//! [`purge_dead_cells`](Module::purge_dead_cells) compaction.

use crate::arena::Arena;
use crate::cell::{Cell, CellKind, Connection};
use crate::ids::{CellId, ModuleId, PortId, ProcessId, WireId};
use crate::sigspec::{SigBit, SigSpec};
use salix_common::{Ident, Interner};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The direction of a port on a module boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// An input port (data flows into the module).
    Input,
    /// An output port (data flows out of the module).
    Output,
}

/// A port in a module's external interface.
///
/// Each port is backed by a [`Wire`] inside the module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// The unique ID of this port.
    pub id: PortId,
    /// The port name.
    pub name: Ident,
    /// The direction of data flow.
    pub direction: PortDirection,
    /// The wire within the module that backs this port.
    pub wire: WireId,
}

/// A named wire within a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    /// The unique ID of this wire within its module.
    pub id: WireId,
    /// The wire name.
    pub name: Ident,
    /// The wire width in bits.
    pub width: u32,
}

/// An unresolved behavioral process.
///
/// Processes are opaque to the optimizer: a module that still contains
/// any is handed back to the frontend untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    /// The unique ID of this process within its module.
    pub id: ProcessId,
    /// The process name.
    pub name: Ident,
}

/// A single hardware module in the design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// The unique ID of this module in the design.
    pub id: ModuleId,
    /// The module name.
    pub name: Ident,
    /// The module's external port interface.
    pub ports: Vec<Port>,
    /// All wires declared within this module.
    pub wires: Arena<WireId, Wire>,
    /// All primitive cells within this module.
    pub cells: Arena<CellId, Cell>,
    /// Unresolved behavioral processes (cause the optimizer to skip).
    pub processes: Arena<ProcessId, Process>,
    /// Module-level connections: each entry drives `lhs` from `rhs`.
    pub connections: Vec<(SigSpec, SigSpec)>,
    /// Cells marked dead by a pass, pending [`purge_dead_cells`](Self::purge_dead_cells).
    #[serde(skip)]
    dead_cells: HashSet<CellId>,
}

impl Module {
    /// Creates a new empty module.
    pub fn new(id: ModuleId, name: Ident) -> Self {
        Self {
            id,
            name,
            ports: Vec::new(),
            wires: Arena::new(),
            cells: Arena::new(),
            processes: Arena::new(),
            connections: Vec::new(),
            dead_cells: HashSet::new(),
        }
    }

    /// Adds a wire to the module and returns its ID.
    pub fn add_wire(&mut self, name: Ident, width: u32) -> WireId {
        let id = WireId::from_raw(self.wires.len() as u32);
        self.wires.alloc(Wire { id, name, width })
    }

    /// Adds a cell to the module and returns its ID.
    pub fn add_cell(&mut self, name: Ident, kind: CellKind, connections: Vec<Connection>) -> CellId {
        let id = CellId::from_raw(self.cells.len() as u32);
        self.cells.alloc(Cell {
            id,
            name,
            kind,
            connections,
        })
    }

    /// Adds a port backed by an existing wire and returns its ID.
    pub fn add_port(&mut self, name: Ident, direction: PortDirection, wire: WireId) -> PortId {
        let id = PortId::from_raw(self.ports.len() as u32);
        self.ports.push(Port {
            id,
            name,
            direction,
            wire,
        });
        id
    }

    /// Adds an unresolved process to the module and returns its ID.
    pub fn add_process(&mut self, name: Ident) -> ProcessId {
        let id = ProcessId::from_raw(self.processes.len() as u32);
        self.processes.alloc(Process { id, name })
    }

    /// Returns `true` if this module still contains unresolved processes.
    pub fn has_processes(&self) -> bool {
        !self.processes.is_empty()
    }

    /// Adds a module-level connection driving `lhs` from `rhs`.
    pub fn connect(&mut self, lhs: SigSpec, rhs: SigSpec) {
        self.connections.push((lhs, rhs));
    }

    /// Marks a cell as dead. The cell stays in the arena (IDs remain
    /// stable) until [`purge_dead_cells`](Self::purge_dead_cells) runs.
    pub fn remove_cell(&mut self, id: CellId) {
        self.dead_cells.insert(id);
    }

    /// Returns `true` if the cell has been marked dead.
    pub fn is_cell_dead(&self, id: CellId) -> bool {
        self.dead_cells.contains(&id)
    }

    /// Iterates over `(ID, &Cell)` pairs of cells not marked dead.
    pub fn live_cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells.iter().filter(|(id, _)| !self.dead_cells.contains(id))
    }

    /// Returns the number of cells not marked dead.
    pub fn live_cell_count(&self) -> usize {
        self.cells.len() - self.dead_cells.len()
    }

    /// Compacts the cell arena, dropping dead cells and renumbering the
    /// survivors densely. Call once per module after a pass finishes;
    /// any [`CellId`] held across this call is invalidated.
    pub fn purge_dead_cells(&mut self) {
        if self.dead_cells.is_empty() {
            return;
        }
        let mut compacted = Arena::new();
        for (old_id, cell) in self.cells.iter() {
            if self.dead_cells.contains(&old_id) {
                continue;
            }
            let mut cell = cell.clone();
            cell.id = CellId::from_raw(compacted.len() as u32);
            compacted.alloc(cell);
        }
        self.cells = compacted;
        self.dead_cells.clear();
    }

    /// Returns the width of a wire.
    pub fn wire_width(&self, id: WireId) -> u32 {
        self.wires.get(id).width
    }

    /// Renders a signal as a human-readable string like `{b[1], a, 1'b0}`
    /// for diagnostics. Runs of adjacent bits of the same wire are grouped.
    pub fn signal_to_string(&self, sig: &SigSpec, interner: &Interner) -> String {
        if sig.is_empty() {
            return "{}".to_string();
        }
        let mut chunks: Vec<String> = Vec::new();
        let mut i = 0;
        // MSB-first, matching HDL concatenation syntax
        let bits = sig.bits();
        let mut rev: Vec<SigBit> = bits.to_vec();
        rev.reverse();
        while i < rev.len() {
            match rev[i] {
                SigBit::Const(_) => {
                    let mut text = String::new();
                    while i < rev.len() {
                        if let SigBit::Const(value) = rev[i] {
                            text.push(value.as_char());
                            i += 1;
                        } else {
                            break;
                        }
                    }
                    chunks.push(format!("{}'b{}", text.len(), text));
                }
                SigBit::Wire { wire, offset } => {
                    let width = self.wire_width(wire);
                    let mut low = offset;
                    let high = offset;
                    i += 1;
                    while i < rev.len() {
                        match rev[i] {
                            SigBit::Wire {
                                wire: next_wire,
                                offset: next_offset,
                            } if next_wire == wire && next_offset + 1 == low => {
                                low = next_offset;
                                i += 1;
                            }
                            _ => break,
                        }
                    }
                    let name = interner.resolve(self.wires.get(wire).name);
                    if low == 0 && high + 1 == width {
                        chunks.push(name.to_string());
                    } else if low == high {
                        chunks.push(format!("{name}[{low}]"));
                    } else {
                        chunks.push(format!("{name}[{high}:{low}]"));
                    }
                }
            }
        }
        if chunks.len() == 1 {
            chunks.pop().unwrap()
        } else {
            format!("{{{}}}", chunks.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salix_common::Logic;

    fn test_module(interner: &Interner) -> Module {
        Module::new(ModuleId::from_raw(0), interner.get_or_intern("top"))
    }

    #[test]
    fn add_wire_and_port() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let w = m.add_wire(interner.get_or_intern("clk"), 1);
        let p = m.add_port(interner.get_or_intern("clk"), PortDirection::Input, w);
        assert_eq!(m.wires.len(), 1);
        assert_eq!(m.wire_width(w), 1);
        assert_eq!(m.ports[p.as_raw() as usize].wire, w);
    }

    #[test]
    fn add_cell_assigns_dense_ids() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_cell(
            interner.get_or_intern("g0"),
            CellKind::Not { width: 1 },
            vec![],
        );
        let b = m.add_cell(
            interner.get_or_intern("g1"),
            CellKind::Not { width: 1 },
            vec![],
        );
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert_eq!(m.cells.get(b).id, b);
    }

    #[test]
    fn remove_cell_marks_dead() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let c = m.add_cell(
            interner.get_or_intern("g0"),
            CellKind::Not { width: 1 },
            vec![],
        );
        assert_eq!(m.live_cell_count(), 1);
        m.remove_cell(c);
        assert!(m.is_cell_dead(c));
        assert_eq!(m.live_cell_count(), 0);
        assert_eq!(m.cells.len(), 1); // still in the arena until purge
    }

    #[test]
    fn live_cells_skips_dead() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_cell(
            interner.get_or_intern("g0"),
            CellKind::Not { width: 1 },
            vec![],
        );
        let b = m.add_cell(
            interner.get_or_intern("g1"),
            CellKind::And { width: 1 },
            vec![],
        );
        m.remove_cell(a);
        let live: Vec<CellId> = m.live_cells().map(|(id, _)| id).collect();
        assert_eq!(live, vec![b]);
    }

    #[test]
    fn purge_compacts_and_renumbers() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_cell(
            interner.get_or_intern("g0"),
            CellKind::Not { width: 1 },
            vec![],
        );
        m.add_cell(
            interner.get_or_intern("g1"),
            CellKind::And { width: 1 },
            vec![],
        );
        m.remove_cell(a);
        m.purge_dead_cells();
        assert_eq!(m.cells.len(), 1);
        let (id, cell) = m.cells.iter().next().unwrap();
        assert_eq!(id.as_raw(), 0);
        assert_eq!(cell.id, id);
        assert_eq!(cell.kind, CellKind::And { width: 1 });
        assert_eq!(m.live_cell_count(), 1);
    }

    #[test]
    fn processes_gate_optimization() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        assert!(!m.has_processes());
        m.add_process(interner.get_or_intern("proc0"));
        assert!(m.has_processes());
    }

    #[test]
    fn connect_records_assignment() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("a"), 1);
        let b = m.add_wire(interner.get_or_intern("b"), 1);
        m.connect(SigSpec::from_wire(a, 1), SigSpec::from_wire(b, 1));
        assert_eq!(m.connections.len(), 1);
    }

    #[test]
    fn signal_to_string_whole_wire() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("data"), 4);
        let sig = SigSpec::from_wire(a, 4);
        assert_eq!(m.signal_to_string(&sig, &interner), "data");
    }

    #[test]
    fn signal_to_string_slice_and_consts() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("data"), 4);
        let mut sig = SigSpec::from(Logic::Zero);
        sig.append(&SigSpec::from_wire(a, 4).extract(1, 2));
        // MSB first: data[2:1] then the constant LSB
        assert_eq!(
            m.signal_to_string(&sig, &interner),
            "{data[2:1], 1'b0}"
        );
    }

    #[test]
    fn signal_to_string_single_bit() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("sel"), 4);
        let sig = SigSpec::from_wire(a, 4).extract(2, 1);
        assert_eq!(m.signal_to_string(&sig, &interner), "sel[2]");
    }
}
