use crate::opcode;
use bitvec::{bitvec, order::Lsb0, vec::BitVec};
use core::fmt;
use primitives::hex;
use std::sync::Arc;

/// A table of valid `JUMP` destinations.
///
/// One bit per byte of the original code. Immutable and cheap to clone.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct JumpTable(Arc<BitVec<u8>>);

impl fmt::Debug for JumpTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JumpTable")
            .field(&hex::encode(self.0.as_raw_slice()))
            .finish()
    }
}

impl JumpTable {
    /// Gets the raw bytes of the jump map.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_raw_slice()
    }

    /// Number of bytes covered by the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the table covers no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks if `pc` is a valid jump destination.
    #[inline]
    pub fn is_valid(&self, pc: usize) -> bool {
        pc < self.0.len() && self.0[pc]
    }
}

/// Marks every `JUMPDEST` that is not part of a `PUSH` immediate.
pub fn analyze_legacy(code: &[u8]) -> JumpTable {
    let mut jumps: BitVec<u8> = bitvec![u8, Lsb0; 0; code.len()];

    let mut i = 0;
    while i < code.len() {
        let op = code[i];
        if op == opcode::JUMPDEST {
            jumps.set(i, true);
            i += 1;
        } else {
            let push_offset = op.wrapping_sub(opcode::PUSH1);
            if push_offset < 32 {
                i += push_offset as usize + 2;
            } else {
                i += 1;
            }
        }
    }

    JumpTable(Arc::new(jumps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jumpdest_inside_push_is_not_valid() {
        // PUSH2 0x5b5b JUMPDEST
        let table = analyze_legacy(&[opcode::PUSH2, 0x5b, 0x5b, opcode::JUMPDEST]);
        assert!(!table.is_valid(1));
        assert!(!table.is_valid(2));
        assert!(table.is_valid(3));
        assert!(!table.is_valid(4));
    }

    #[test]
    fn truncated_push_at_end() {
        let table = analyze_legacy(&[opcode::JUMPDEST, opcode::PUSH32, opcode::JUMPDEST]);
        assert!(table.is_valid(0));
        assert!(!table.is_valid(2));
        assert_eq!(table.len(), 3);
    }
}
