//! Shared foundational types used across the Salix netlist toolkit.
//!
//! This crate provides interned identifiers, 4-state logic values, packed
//! logic vectors, and the common internal-error type.

#![warn(missing_docs)]

pub mod ident;
pub mod logic;
pub mod logic_vec;
pub mod result;

pub use ident::{Ident, Interner};
pub use logic::Logic;
pub use logic_vec::LogicVec;
pub use result::{InternalError, SalixResult};
