//! Cell definitions for netlist primitives.
//!
//! A [`Cell`] is a primitive operation (gate, multiplexer, flip-flop)
//! connected to signals through named ports. The multiplexer kinds carry
//! the port layout that the mux-tree pass destructures: a binary [`Mux`]
//! selects between A and B with a 1-bit S, a priority [`Pmux`] stacks
//! `select_width` selectable inputs on B over the default input A.
//!
//! [`Mux`]: CellKind::Mux
//! [`Pmux`]: CellKind::Pmux

use crate::ids::CellId;
use crate::sigspec::SigSpec;
use salix_common::{Ident, LogicVec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a primitive cell, with its width parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Bitwise NOT gate. Ports: A (in), Y (out).
    Not {
        /// Operand width in bits.
        width: u32,
    },
    /// Bitwise AND gate. Ports: A, B (in), Y (out).
    And {
        /// Operand width in bits.
        width: u32,
    },
    /// Bitwise OR gate. Ports: A, B (in), Y (out).
    Or {
        /// Operand width in bits.
        width: u32,
    },
    /// Bitwise XOR gate. Ports: A, B (in), Y (out).
    Xor {
        /// Operand width in bits.
        width: u32,
    },
    /// Adder. Ports: A, B (in), Y (out).
    Add {
        /// Operand width in bits.
        width: u32,
    },
    /// Equality comparator. Ports: A, B (in), Y (1-bit out).
    Eq {
        /// Operand width in bits.
        width: u32,
    },
    /// Binary multiplexer: `Y = S ? B : A`.
    ///
    /// Ports: A (default input, `width` bits), B (selected input, `width`
    /// bits), S (1-bit selector), Y (`width` bits).
    Mux {
        /// Data width in bits.
        width: u32,
    },
    /// Priority multiplexer.
    ///
    /// Ports: A (default input, `width` bits), B (`select_width` stacked
    /// inputs, `select_width * width` bits), S (`select_width` bits,
    /// priority order: the lowest-indexed asserted selector wins), Y
    /// (`width` bits). A `Pmux` with `select_width == 0` is not a valid
    /// cell and is never produced by the IR.
    Pmux {
        /// Data width in bits.
        width: u32,
        /// Number of selectable inputs (selector width).
        select_width: u32,
    },
    /// D flip-flop. Ports: Clk, D (in), Q (out).
    Dff {
        /// Data width in bits.
        width: u32,
    },
    /// Constant value source. Ports: Y (out).
    Const {
        /// The constant value driven on Y.
        value: LogicVec,
    },
}

impl CellKind {
    /// Returns `true` for the multiplexer kinds the mux-tree pass handles.
    pub fn is_mux(&self) -> bool {
        matches!(self, CellKind::Mux { .. } | CellKind::Pmux { .. })
    }

    /// Returns the lowercase kind name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            CellKind::Not { .. } => "not",
            CellKind::And { .. } => "and",
            CellKind::Or { .. } => "or",
            CellKind::Xor { .. } => "xor",
            CellKind::Add { .. } => "add",
            CellKind::Eq { .. } => "eq",
            CellKind::Mux { .. } => "mux",
            CellKind::Pmux { .. } => "pmux",
            CellKind::Dff { .. } => "dff",
            CellKind::Const { .. } => "const",
        }
    }
}

/// The name of a port on a primitive cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortName {
    /// First operand / default mux input.
    A,
    /// Second operand / stacked mux inputs.
    B,
    /// Multiplexer selector.
    S,
    /// Primary output.
    Y,
    /// Clock input.
    Clk,
    /// Flip-flop data input.
    D,
    /// Flip-flop data output.
    Q,
    /// Enable input.
    En,
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PortName::A => "A",
            PortName::B => "B",
            PortName::S => "S",
            PortName::Y => "Y",
            PortName::Clk => "CLK",
            PortName::D => "D",
            PortName::Q => "Q",
            PortName::En => "EN",
        };
        write!(f, "{name}")
    }
}

/// A connection between a cell port and a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// The port on the cell.
    pub port: PortName,
    /// The signal connected to this port.
    pub signal: SigSpec,
}

/// A primitive cell in the netlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// The unique ID of this cell within its module.
    pub id: CellId,
    /// The cell instance name.
    pub name: Ident,
    /// The kind of cell, with width parameters.
    pub kind: CellKind,
    /// The port-to-signal connections.
    pub connections: Vec<Connection>,
}

impl Cell {
    /// Returns the signal connected to the given port, if any.
    pub fn port(&self, name: PortName) -> Option<&SigSpec> {
        self.connections
            .iter()
            .find(|conn| conn.port == name)
            .map(|conn| &conn.signal)
    }

    /// Connects the given port to a signal, replacing any existing
    /// connection on that port.
    pub fn set_port(&mut self, name: PortName, signal: SigSpec) {
        match self.connections.iter_mut().find(|conn| conn.port == name) {
            Some(conn) => conn.signal = signal,
            None => self.connections.push(Connection { port: name, signal }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::WireId;
    use salix_common::Logic;

    fn dummy_cell(kind: CellKind) -> Cell {
        Cell {
            id: CellId::from_raw(0),
            name: Ident::from_raw(1),
            kind,
            connections: Vec::new(),
        }
    }

    #[test]
    fn mux_kinds() {
        assert!(dummy_cell(CellKind::Mux { width: 4 }).kind.is_mux());
        assert!(dummy_cell(CellKind::Pmux {
            width: 4,
            select_width: 3
        })
        .kind
        .is_mux());
        assert!(!dummy_cell(CellKind::And { width: 1 }).kind.is_mux());
    }

    #[test]
    fn kind_names() {
        assert_eq!(CellKind::Mux { width: 1 }.name(), "mux");
        assert_eq!(
            CellKind::Pmux {
                width: 1,
                select_width: 2
            }
            .name(),
            "pmux"
        );
        assert_eq!(CellKind::Dff { width: 8 }.name(), "dff");
    }

    #[test]
    fn port_lookup() {
        let mut cell = dummy_cell(CellKind::Mux { width: 1 });
        let a = SigSpec::from_wire(WireId::from_raw(0), 1);
        let y = SigSpec::from_wire(WireId::from_raw(1), 1);
        cell.set_port(PortName::A, a.clone());
        cell.set_port(PortName::Y, y);
        assert_eq!(cell.port(PortName::A), Some(&a));
        assert!(cell.port(PortName::S).is_none());
    }

    #[test]
    fn set_port_replaces() {
        let mut cell = dummy_cell(CellKind::Not { width: 1 });
        cell.set_port(PortName::A, SigSpec::from(Logic::Zero));
        cell.set_port(PortName::A, SigSpec::from(Logic::One));
        assert_eq!(cell.connections.len(), 1);
        assert_eq!(cell.port(PortName::A), Some(&SigSpec::from(Logic::One)));
    }

    #[test]
    fn port_name_display() {
        assert_eq!(format!("{}", PortName::A), "A");
        assert_eq!(format!("{}", PortName::Clk), "CLK");
    }
}
