//! Alias resolution over wire bits.
//!
//! Module-level connections (`assign` statements) make several wire bits
//! carry the same value. [`SigMap`] computes the equivalence closure of
//! those direct wire-to-wire assignments and maps every bit to one
//! canonical representative, so passes can compare signals structurally.

use crate::module::Module;
use crate::sigspec::{SigBit, SigSpec};
use std::collections::HashMap;

/// The pre-computed assign-alias closure over a module's wire bits.
///
/// Built once per module from `module.connections` with a union-find over
/// bits. Constant bits are preferred as representatives, so a wire bit
/// tied to a constant canonicalizes to that constant. The finished map is
/// flattened: lookups are a single hash probe and take `&self`.
pub struct SigMap {
    map: HashMap<SigBit, SigBit>,
}

impl SigMap {
    /// Builds the alias closure for a module.
    ///
    /// Connections whose two sides differ in width contribute nothing
    /// (malformed input is tolerated, not an error). Assignment cycles
    /// collapse into a single equivalence class.
    pub fn from_module(module: &Module) -> Self {
        let mut parent: HashMap<SigBit, SigBit> = HashMap::new();

        for (lhs, rhs) in &module.connections {
            if lhs.width() != rhs.width() {
                continue;
            }
            for i in 0..lhs.width() {
                let a = find(&parent, lhs.bit(i));
                let b = find(&parent, rhs.bit(i));
                if a == b {
                    continue;
                }
                match (a.is_const(), b.is_const()) {
                    // Two distinct constants asserted equal: contradictory
                    // input, keep the first and move on.
                    (true, true) => {}
                    // The driver side wins unless the other root is a constant.
                    (true, false) => {
                        parent.insert(b, a);
                    }
                    _ => {
                        parent.insert(a, b);
                    }
                }
            }
        }

        // Flatten chains so canonical_bit is a single lookup.
        let keys: Vec<SigBit> = parent.keys().copied().collect();
        let mut map = HashMap::with_capacity(keys.len());
        for key in keys {
            map.insert(key, find(&parent, key));
        }
        Self { map }
    }

    /// Returns the canonical representative of a bit.
    pub fn canonical_bit(&self, bit: SigBit) -> SigBit {
        *self.map.get(&bit).unwrap_or(&bit)
    }

    /// Returns the canonical form of a signal, bit by bit.
    pub fn canonical(&self, sig: &SigSpec) -> SigSpec {
        SigSpec::from_bits(sig.iter().map(|bit| self.canonical_bit(bit)).collect())
    }
}

/// Follows parent links to the root of a bit's equivalence class.
///
/// Links always point root-to-root when inserted, so chains are acyclic
/// and this terminates.
fn find(parent: &HashMap<SigBit, SigBit>, mut bit: SigBit) -> SigBit {
    while let Some(&next) = parent.get(&bit) {
        bit = next;
    }
    bit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ModuleId;
    use salix_common::{Interner, Logic};

    fn test_module(interner: &Interner) -> Module {
        Module::new(ModuleId::from_raw(0), interner.get_or_intern("top"))
    }

    #[test]
    fn unconnected_bits_are_their_own_canonical() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("a"), 2);
        let map = SigMap::from_module(&m);
        let sig = SigSpec::from_wire(a, 2);
        assert_eq!(map.canonical(&sig), sig);
    }

    #[test]
    fn direct_alias_collapses() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("a"), 1);
        let b = m.add_wire(interner.get_or_intern("b"), 1);
        m.connect(SigSpec::from_wire(a, 1), SigSpec::from_wire(b, 1));
        let map = SigMap::from_module(&m);
        assert_eq!(
            map.canonical(&SigSpec::from_wire(a, 1)),
            map.canonical(&SigSpec::from_wire(b, 1))
        );
    }

    #[test]
    fn alias_chain_collapses() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("a"), 1);
        let b = m.add_wire(interner.get_or_intern("b"), 1);
        let c = m.add_wire(interner.get_or_intern("c"), 1);
        m.connect(SigSpec::from_wire(a, 1), SigSpec::from_wire(b, 1));
        m.connect(SigSpec::from_wire(b, 1), SigSpec::from_wire(c, 1));
        let map = SigMap::from_module(&m);
        let ca = map.canonical_bit(SigSpec::from_wire(a, 1).bit(0));
        let cb = map.canonical_bit(SigSpec::from_wire(b, 1).bit(0));
        let cc = map.canonical_bit(SigSpec::from_wire(c, 1).bit(0));
        assert_eq!(ca, cb);
        assert_eq!(cb, cc);
    }

    #[test]
    fn assignment_cycle_terminates() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("a"), 1);
        let b = m.add_wire(interner.get_or_intern("b"), 1);
        m.connect(SigSpec::from_wire(a, 1), SigSpec::from_wire(b, 1));
        m.connect(SigSpec::from_wire(b, 1), SigSpec::from_wire(a, 1));
        let map = SigMap::from_module(&m);
        assert_eq!(
            map.canonical_bit(SigSpec::from_wire(a, 1).bit(0)),
            map.canonical_bit(SigSpec::from_wire(b, 1).bit(0))
        );
    }

    #[test]
    fn constant_becomes_representative() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("a"), 1);
        let b = m.add_wire(interner.get_or_intern("b"), 1);
        // b aliases a, and a is tied to constant 1
        m.connect(SigSpec::from_wire(b, 1), SigSpec::from_wire(a, 1));
        m.connect(SigSpec::from_wire(a, 1), SigSpec::from(Logic::One));
        let map = SigMap::from_module(&m);
        assert_eq!(
            map.canonical_bit(SigSpec::from_wire(b, 1).bit(0)),
            SigBit::Const(Logic::One)
        );
    }

    #[test]
    fn width_mismatch_ignored() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("a"), 2);
        let b = m.add_wire(interner.get_or_intern("b"), 1);
        m.connect(SigSpec::from_wire(a, 2), SigSpec::from_wire(b, 1));
        let map = SigMap::from_module(&m);
        let sig = SigSpec::from_wire(a, 2);
        assert_eq!(map.canonical(&sig), sig);
    }

    #[test]
    fn per_bit_mapping_of_vectors() {
        let interner = Interner::new();
        let mut m = test_module(&interner);
        let a = m.add_wire(interner.get_or_intern("a"), 2);
        let b = m.add_wire(interner.get_or_intern("b"), 2);
        m.connect(SigSpec::from_wire(a, 2), SigSpec::from_wire(b, 2));
        let map = SigMap::from_module(&m);
        let canon = map.canonical(&SigSpec::from_wire(a, 2));
        assert_eq!(canon.bit(0), SigSpec::from_wire(b, 2).bit(0));
        assert_eq!(canon.bit(1), SigSpec::from_wire(b, 2).bit(1));
    }
}
