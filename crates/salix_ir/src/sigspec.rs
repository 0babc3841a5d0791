//! Bit-level signal references.
//!
//! A [`SigBit`] is one bit of a signal: either a constant logic value or
//! one bit of a wire. A [`SigSpec`] is an ordered vector of bits and is the
//! currency of every cell connection and module-level assignment. Passes
//! slice, concatenate, and compare `SigSpec`s rather than whole wires.

use crate::ids::WireId;
use salix_common::{Logic, LogicVec};
use serde::{Deserialize, Serialize};

/// One bit of a signal: a constant or a single bit of a wire.
///
/// Two wire bits are the same signal iff their `wire` and `offset` match;
/// constant bits compare by value. This makes `SigBit` usable as a hash
/// key for bit-granular dataflow maps.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SigBit {
    /// A constant logic value.
    Const(Logic),
    /// One bit of a wire.
    Wire {
        /// The wire this bit belongs to.
        wire: WireId,
        /// The bit offset within the wire, starting at 0.
        offset: u32,
    },
}

impl SigBit {
    /// Returns `true` if this bit is a constant.
    pub fn is_const(self) -> bool {
        matches!(self, SigBit::Const(_))
    }

    /// Returns the constant value of this bit, if it is one.
    pub fn as_const(self) -> Option<Logic> {
        match self {
            SigBit::Const(value) => Some(value),
            SigBit::Wire { .. } => None,
        }
    }
}

impl From<Logic> for SigBit {
    fn from(value: Logic) -> Self {
        SigBit::Const(value)
    }
}

/// An ordered vector of signal bits.
///
/// Bit 0 is the least significant position. Equality is canonical:
/// two `SigSpec`s are equal iff they are the same bits in the same order.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct SigSpec {
    bits: Vec<SigBit>,
}

impl SigSpec {
    /// Creates an empty signal.
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Creates a signal from a vector of bits.
    pub fn from_bits(bits: Vec<SigBit>) -> Self {
        Self { bits }
    }

    /// Creates a signal covering all bits of a wire, LSB first.
    pub fn from_wire(wire: WireId, width: u32) -> Self {
        Self {
            bits: (0..width).map(|offset| SigBit::Wire { wire, offset }).collect(),
        }
    }

    /// Creates a constant signal from a logic vector.
    pub fn from_const(value: &LogicVec) -> Self {
        Self {
            bits: (0..value.width())
                .map(|i| SigBit::Const(value.get(i)))
                .collect(),
        }
    }

    /// Returns the number of bits in this signal.
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if this signal has no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the bit at the given position.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn bit(&self, index: usize) -> SigBit {
        self.bits[index]
    }

    /// Replaces the bit at the given position.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set_bit(&mut self, index: usize, bit: SigBit) {
        self.bits[index] = bit;
    }

    /// Returns the bits as a slice.
    pub fn bits(&self) -> &[SigBit] {
        &self.bits
    }

    /// Iterates over the bits, LSB first.
    pub fn iter(&self) -> impl Iterator<Item = SigBit> + '_ {
        self.bits.iter().copied()
    }

    /// Extracts a sub-range of `len` bits starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past the end of the signal.
    pub fn extract(&self, offset: usize, len: usize) -> SigSpec {
        SigSpec {
            bits: self.bits[offset..offset + len].to_vec(),
        }
    }

    /// Appends another signal's bits after this one's.
    pub fn append(&mut self, other: &SigSpec) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Returns `true` if every bit is a constant.
    ///
    /// An empty signal is fully constant.
    pub fn is_fully_const(&self) -> bool {
        self.bits.iter().all(|bit| bit.is_const())
    }

    /// Converts to a [`LogicVec`] if every bit is a constant.
    pub fn as_const(&self) -> Option<LogicVec> {
        let mut value = LogicVec::new(self.bits.len() as u32);
        for (i, bit) in self.bits.iter().enumerate() {
            value.set(i as u32, bit.as_const()?);
        }
        Some(value)
    }

    /// Interprets a fully constant signal as a boolean.
    ///
    /// Returns `Some(true)` iff any bit is driven `One`; X and Z count as
    /// low. Returns `None` if any bit is a wire.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_const().map(|value| value.to_bool())
    }
}

impl From<SigBit> for SigSpec {
    fn from(bit: SigBit) -> Self {
        Self { bits: vec![bit] }
    }
}

impl From<Logic> for SigSpec {
    fn from(value: Logic) -> Self {
        Self {
            bits: vec![SigBit::Const(value)],
        }
    }
}
