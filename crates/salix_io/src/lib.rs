//! JSON netlist reading and writing.
//!
//! The exchange format mirrors the IR with names in place of interned
//! identifiers and arena IDs: a [`RawDesign`] holds modules by name, each
//! module holds named wires, ports, cells, and connections, and signal
//! bits refer to wires by name. Reading a design interns every name and
//! resolves references; writing resolves them back.

#![warn(missing_docs)]

use salix_common::{Interner, Logic};
use salix_ir::{
    CellKind, Connection, Design, Module, ModuleId, PortDirection, PortName, SigBit, SigSpec,
    WireId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Errors produced while reading or writing a netlist.
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// An I/O error occurred.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The JSON was malformed.
    #[error("malformed netlist JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The designated top module does not exist.
    #[error("top module `{0}` does not exist")]
    UnknownModule(String),

    /// A signal bit refers to a wire that does not exist.
    #[error("module `{module}`: unknown wire `{wire}`")]
    UnknownWire {
        /// The module containing the reference.
        module: String,
        /// The unresolved wire name.
        wire: String,
    },

    /// A signal bit refers past the end of a wire.
    #[error("module `{module}`: bit {offset} out of range for wire `{wire}`")]
    BitOutOfRange {
        /// The module containing the reference.
        module: String,
        /// The referenced wire name.
        wire: String,
        /// The out-of-range bit offset.
        offset: u32,
    },

    /// A constant bit literal was not one of `0`, `1`, `x`, `z`.
    #[error("invalid constant bit literal `{0}`")]
    BadConstant(String),

    /// A cell's connections are inconsistent with its kind.
    #[error("module `{module}`: invalid cell `{cell}`: {reason}")]
    InvalidCell {
        /// The module containing the cell.
        module: String,
        /// The cell name.
        cell: String,
        /// Why the cell was rejected.
        reason: String,
    },
}

/// One bit of a raw signal: a constant literal or a named wire bit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSigBit {
    /// A constant logic value: `"0"`, `"1"`, `"x"`, or `"z"`.
    Const(String),
    /// One bit of a named wire.
    Wire {
        /// The wire name.
        wire: String,
        /// The bit offset within the wire.
        #[serde(default)]
        offset: u32,
    },
}

/// A raw signal: an ordered list of bits, LSB first.
pub type RawSigSpec = Vec<RawSigBit>;

/// A port in the raw module interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPort {
    /// The port name.
    pub name: String,
    /// The direction of data flow.
    pub direction: PortDirection,
    /// The name of the wire backing this port.
    pub wire: String,
}

/// A named wire in the raw format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawWire {
    /// The wire name.
    pub name: String,
    /// The wire width in bits.
    pub width: u32,
}

/// A cell in the raw format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCell {
    /// The cell instance name.
    pub name: String,
    /// The cell kind with width parameters.
    pub kind: CellKind,
    /// Port-to-signal connections.
    #[serde(default)]
    pub connections: BTreeMap<PortName, RawSigSpec>,
}

/// A module-level connection driving `lhs` from `rhs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConnection {
    /// The driven signal.
    pub lhs: RawSigSpec,
    /// The driving signal.
    pub rhs: RawSigSpec,
}

/// A module in the raw format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawModule {
    /// The module's external ports.
    #[serde(default)]
    pub ports: Vec<RawPort>,
    /// All wires, in declaration order.
    #[serde(default)]
    pub wires: Vec<RawWire>,
    /// All cells, in declaration order.
    #[serde(default)]
    pub cells: Vec<RawCell>,
    /// Module-level connections (direct assignments).
    #[serde(default)]
    pub connections: Vec<RawConnection>,
    /// Names of unresolved behavioral processes.
    #[serde(default)]
    pub processes: Vec<String>,
}

/// A complete design in the raw exchange format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDesign {
    /// The name of the top-level module, if designated.
    #[serde(default)]
    pub top: Option<String>,
    /// All modules, by name.
    #[serde(default)]
    pub modules: BTreeMap<String, RawModule>,
}

/// Builds an IR design from the raw exchange format, interning all names.
pub fn design_from_raw(raw: &RawDesign, interner: &Interner) -> Result<Design, NetlistError> {
    let mut design = Design::new();
    let mut module_ids: BTreeMap<&str, ModuleId> = BTreeMap::new();

    for (module_name, raw_module) in &raw.modules {
        let id = ModuleId::from_raw(design.modules.len() as u32);
        let mut module = Module::new(id, interner.get_or_intern(module_name));
        let mut wire_ids: BTreeMap<&str, WireId> = BTreeMap::new();

        for raw_wire in &raw_module.wires {
            let wire_id = module.add_wire(interner.get_or_intern(&raw_wire.name), raw_wire.width);
            wire_ids.insert(&raw_wire.name, wire_id);
        }

        for raw_port in &raw_module.ports {
            let wire = resolve_wire(&wire_ids, module_name, &raw_port.wire)?;
            module.add_port(
                interner.get_or_intern(&raw_port.name),
                raw_port.direction,
                wire,
            );
        }

        for raw_cell in &raw_module.cells {
            let mut connections = Vec::with_capacity(raw_cell.connections.len());
            for (port, raw_sig) in &raw_cell.connections {
                connections.push(Connection {
                    port: *port,
                    signal: resolve_sigspec(&module, &wire_ids, module_name, raw_sig)?,
                });
            }
            validate_cell(module_name, raw_cell, &connections)?;
            module.add_cell(
                interner.get_or_intern(&raw_cell.name),
                raw_cell.kind.clone(),
                connections,
            );
        }

        for raw_conn in &raw_module.connections {
            let lhs = resolve_sigspec(&module, &wire_ids, module_name, &raw_conn.lhs)?;
            let rhs = resolve_sigspec(&module, &wire_ids, module_name, &raw_conn.rhs)?;
            module.connect(lhs, rhs);
        }

        for process_name in &raw_module.processes {
            module.add_process(interner.get_or_intern(process_name));
        }

        design.modules.alloc(module);
        module_ids.insert(module_name, id);
    }

    if let Some(top_name) = &raw.top {
        match module_ids.get(top_name.as_str()) {
            Some(&id) => design.top = Some(id),
            None => return Err(NetlistError::UnknownModule(top_name.clone())),
        }
    }

    Ok(design)
}

/// Converts an IR design back to the raw exchange format.
pub fn design_to_raw(design: &Design, interner: &Interner) -> RawDesign {
    let mut modules = BTreeMap::new();
    for module in design.modules.values() {
        let raw_module = RawModule {
            ports: module
                .ports
                .iter()
                .map(|port| RawPort {
                    name: interner.resolve(port.name).to_string(),
                    direction: port.direction,
                    wire: interner.resolve(module.wires.get(port.wire).name).to_string(),
                })
                .collect(),
            wires: module
                .wires
                .values()
                .map(|wire| RawWire {
                    name: interner.resolve(wire.name).to_string(),
                    width: wire.width,
                })
                .collect(),
            cells: module
                .live_cells()
                .map(|(_, cell)| RawCell {
                    name: interner.resolve(cell.name).to_string(),
                    kind: cell.kind.clone(),
                    connections: cell
                        .connections
                        .iter()
                        .map(|conn| (conn.port, raw_sigspec(module, interner, &conn.signal)))
                        .collect(),
                })
                .collect(),
            connections: module
                .connections
                .iter()
                .map(|(lhs, rhs)| RawConnection {
                    lhs: raw_sigspec(module, interner, lhs),
                    rhs: raw_sigspec(module, interner, rhs),
                })
                .collect(),
            processes: module
                .processes
                .values()
                .map(|process| interner.resolve(process.name).to_string())
                .collect(),
        };
        let name = interner.resolve(module.name).to_string();
        modules.insert(name, raw_module);
    }

    RawDesign {
        top: design
            .top
            .map(|id| interner.resolve(design.modules.get(id).name).to_string()),
        modules,
    }
}

/// Parses a design from a JSON string.
pub fn design_from_json(json: &str, interner: &Interner) -> Result<Design, NetlistError> {
    let raw: RawDesign = serde_json::from_str(json)?;
    design_from_raw(&raw, interner)
}

/// Serializes a design to a pretty-printed JSON string.
pub fn design_to_json(design: &Design, interner: &Interner) -> Result<String, NetlistError> {
    let raw = design_to_raw(design, interner);
    Ok(serde_json::to_string_pretty(&raw)?)
}

/// Reads a design from a JSON netlist file.
pub fn read_design(path: &Path, interner: &Interner) -> Result<Design, NetlistError> {
    let json = std::fs::read_to_string(path)?;
    design_from_json(&json, interner)
}

/// Writes a design to a JSON netlist file.
pub fn write_design(path: &Path, design: &Design, interner: &Interner) -> Result<(), NetlistError> {
    let json = design_to_json(design, interner)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn resolve_wire(
    wire_ids: &BTreeMap<&str, WireId>,
    module_name: &str,
    wire_name: &str,
) -> Result<WireId, NetlistError> {
    wire_ids
        .get(wire_name)
        .copied()
        .ok_or_else(|| NetlistError::UnknownWire {
            module: module_name.to_string(),
            wire: wire_name.to_string(),
        })
}

fn resolve_sigspec(
    module: &Module,
    wire_ids: &BTreeMap<&str, WireId>,
    module_name: &str,
    raw: &RawSigSpec,
) -> Result<SigSpec, NetlistError> {
    let mut bits = Vec::with_capacity(raw.len());
    for raw_bit in raw {
        match raw_bit {
            RawSigBit::Const(literal) => {
                let mut chars = literal.chars();
                let value = match (chars.next().and_then(Logic::from_char), chars.next()) {
                    (Some(value), None) => value,
                    _ => return Err(NetlistError::BadConstant(literal.clone())),
                };
                bits.push(SigBit::Const(value));
            }
            RawSigBit::Wire { wire, offset } => {
                let wire_id = resolve_wire(wire_ids, module_name, wire)?;
                if *offset >= module.wire_width(wire_id) {
                    return Err(NetlistError::BitOutOfRange {
                        module: module_name.to_string(),
                        wire: wire.clone(),
                        offset: *offset,
                    });
                }
                bits.push(SigBit::Wire {
                    wire: wire_id,
                    offset: *offset,
                });
            }
        }
    }
    Ok(SigSpec::from_bits(bits))
}

fn raw_sigspec(module: &Module, interner: &Interner, sig: &SigSpec) -> RawSigSpec {
    sig.iter()
        .map(|bit| match bit {
            SigBit::Const(value) => RawSigBit::Const(value.as_char().to_string()),
            SigBit::Wire { wire, offset } => RawSigBit::Wire {
                wire: interner.resolve(module.wires.get(wire).name).to_string(),
                offset,
            },
        })
        .collect()
}

/// Checks that a cell's connections are consistent with its kind.
///
/// Only the multiplexer kinds are strictly checked, since the optimizer
/// destructures their port layout; other cells pass through untouched.
fn validate_cell(
    module_name: &str,
    raw_cell: &RawCell,
    connections: &[Connection],
) -> Result<(), NetlistError> {
    let invalid = |reason: String| NetlistError::InvalidCell {
        module: module_name.to_string(),
        cell: raw_cell.name.clone(),
        reason,
    };
    let port_width = |port: PortName| {
        connections
            .iter()
            .find(|conn| conn.port == port)
            .map(|conn| conn.signal.width())
            .ok_or_else(|| invalid(format!("missing port {port}")))
    };

    match raw_cell.kind {
        CellKind::Mux { width } => {
            let width = width as usize;
            for port in [PortName::A, PortName::B, PortName::Y] {
                if port_width(port)? != width {
                    return Err(invalid(format!("port {port} must be {width} bits")));
                }
            }
            if port_width(PortName::S)? != 1 {
                return Err(invalid("port S must be 1 bit".to_string()));
            }
        }
        CellKind::Pmux {
            width,
            select_width,
        } => {
            if select_width == 0 {
                return Err(invalid("pmux must have at least one selector bit".to_string()));
            }
            let width = width as usize;
            let select_width = select_width as usize;
            for (port, expected) in [
                (PortName::A, width),
                (PortName::B, width * select_width),
                (PortName::S, select_width),
                (PortName::Y, width),
            ] {
                if port_width(port)? != expected {
                    return Err(invalid(format!("port {port} must be {expected} bits")));
                }
            }
        }
        _ => {}
    }
    Ok(())
}
