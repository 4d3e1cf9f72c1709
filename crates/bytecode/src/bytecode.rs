use crate::{analyze_legacy, JumpTable};
use core::fmt;
use primitives::{keccak256, Bytes, B256, KECCAK_EMPTY};
use std::vec::Vec;

/// Number of zero bytes appended to the code.
///
/// A trailing `PUSH32` still reads a full immediate and execution always ends on `STOP`.
const PADDING: usize = 33;

/// Analyzed legacy bytecode.
///
/// Holds the padded code, the original length, the table of valid jump destinations
/// and the Keccak-256 hash of the original code.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bytecode {
    bytecode: Bytes,
    original_len: usize,
    jump_table: JumpTable,
    hash: B256,
}

impl fmt::Debug for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bytecode")
            .field("code", &self.original_bytes())
            .field("hash", &self.hash)
            .finish()
    }
}

impl Default for Bytecode {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Bytecode {
    /// Creates a new empty bytecode.
    #[inline]
    pub fn new() -> Self {
        Self::new_raw(Bytes::new())
    }

    /// Analyzes `bytes` and pads them.
    pub fn new_raw(bytes: Bytes) -> Self {
        let original_len = bytes.len();
        let jump_table = analyze_legacy(&bytes);
        let hash = if bytes.is_empty() {
            KECCAK_EMPTY
        } else {
            keccak256(&bytes)
        };

        let mut padded = Vec::with_capacity(original_len + PADDING);
        padded.extend_from_slice(&bytes);
        padded.resize(original_len + PADDING, 0);

        Self {
            bytecode: padded.into(),
            original_len,
            jump_table,
            hash,
        }
    }

    /// Padded code, as executed by the interpreter.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.bytecode
    }

    /// Padded code as a slice.
    #[inline]
    pub fn bytes_slice(&self) -> &[u8] {
        &self.bytecode
    }

    /// Original bytes without padding.
    #[inline]
    pub fn original_bytes(&self) -> Bytes {
        self.bytecode.slice(..self.original_len)
    }

    /// Original bytes without padding, as a slice.
    #[inline]
    pub fn original_byte_slice(&self) -> &[u8] {
        &self.bytecode[..self.original_len]
    }

    /// Length of the original code.
    #[inline]
    pub fn len(&self) -> usize {
        self.original_len
    }

    /// Returns true if the original code is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.original_len == 0
    }

    /// Cached Keccak-256 hash of the original code.
    #[inline]
    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Recomputes the Keccak-256 hash of the original code.
    pub fn hash_slow(&self) -> B256 {
        if self.is_empty() {
            KECCAK_EMPTY
        } else {
            keccak256(self.original_byte_slice())
        }
    }

    /// Returns the jump table.
    #[inline]
    pub fn jump_table(&self) -> &JumpTable {
        &self.jump_table
    }

    /// Checks if `pc` is a `JUMPDEST` outside of any push immediate.
    #[inline]
    pub fn is_valid_jump(&self, pc: usize) -> bool {
        self.jump_table.is_valid(pc)
    }
}

impl From<Bytes> for Bytecode {
    fn from(bytes: Bytes) -> Self {
        Self::new_raw(bytes)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Bytecode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.original_bytes().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Bytecode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Bytes::deserialize(deserializer).map(Self::new_raw)
    }
}
