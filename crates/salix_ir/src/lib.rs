//! The Salix netlist intermediate representation.
//!
//! This crate defines the core IR types including [`Design`], [`Module`],
//! [`Wire`], [`Cell`], and the bit-level signal types [`SigBit`] and
//! [`SigSpec`] that optimization passes operate on.

#![warn(missing_docs)]

pub mod arena;
pub mod cell;
pub mod design;
pub mod ids;
pub mod module;
pub mod sigmap;
pub mod sigspec;

pub use arena::{Arena, ArenaId};
pub use cell::{Cell, CellKind, Connection, PortName};
pub use design::Design;
pub use ids::{CellId, ModuleId, PortId, ProcessId, WireId};
pub use module::{Module, Port, PortDirection, Process, Wire};
pub use sigmap::SigMap;
pub use sigspec::{SigBit, SigSpec};
