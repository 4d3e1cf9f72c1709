use core::cmp::min;
use primitives::U256;
use std::vec::Vec;

/// Byte-addressed memory of one call frame. Grows in 32-byte words.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create a new empty memory.
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(4 * 1024),
        }
    }

    /// Get the length of the current memory range.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Return true if current effective memory range is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the full memory.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the type and returns the full memory.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Resize the memory. Assumes the expansion was already charged and `new_size` is a
    /// multiple of 32.
    pub fn resize(&mut self, new_size: usize) {
        self.data.resize(new_size, 0);
    }

    /// Returns the memory region `offset..offset + size`. The range must be in bounds.
    #[inline]
    pub fn slice(&self, offset: usize, size: usize) -> &[u8] {
        &self.data[offset..offset + size]
    }

    /// Sets the byte at `index`.
    #[inline]
    pub fn set_byte(&mut self, index: usize, byte: u8) {
        self.data[index] = byte;
    }

    /// Writes `value` as 32 big-endian bytes at `index`.
    #[inline]
    pub fn set_u256(&mut self, index: usize, value: U256) {
        self.data[index..index + 32].copy_from_slice(&value.to_be_bytes::<{ U256::BYTES }>());
    }

    /// Reads 32 big-endian bytes at `index`.
    #[inline]
    pub fn get_u256(&self, index: usize) -> U256 {
        U256::from_be_slice(self.slice(index, 32))
    }

    /// Set memory region at given offset. The offset and value are already checked
    #[inline]
    pub fn set(&mut self, offset: usize, value: &[u8]) {
        if !value.is_empty() {
            self.data[offset..(value.len() + offset)].copy_from_slice(value);
        }
    }

    /// Set memory from data. Our memory offset+len is expected to be correct but we
    /// are doing bound checks on data/data_offset/len and zeroing parts that is not copied.
    #[inline]
    pub fn set_data(&mut self, memory_offset: usize, data_offset: usize, len: usize, data: &[u8]) {
        if data_offset >= data.len() {
            // nullify all memory slots
            self.data[memory_offset..memory_offset + len].fill(0);
            return;
        }
        let data_end = min(data_offset + len, data.len());
        let memory_data_end = memory_offset + (data_end - data_offset);
        self.data[memory_offset..memory_data_end].copy_from_slice(&data[data_offset..data_end]);

        // nullify rest of memory slots
        self.data[memory_data_end..memory_offset + len].fill(0);
    }

    /// In memory copy given a src, dst, and length. Both ranges must be in bounds.
    #[inline]
    pub fn copy(&mut self, dst: usize, src: usize, length: usize) {
        self.data.copy_within(src..src + length, dst);
    }
}

/// Number of 32-byte words needed to hold `len` bytes.
#[inline]
pub const fn num_words(len: usize) -> usize {
    len.saturating_add(31) / 32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy() {
        let mut memory = Memory::new();

        let data: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        memory.resize(data.len());
        memory.set_data(0, 0, data.len(), &data);

        memory.copy(5, 0, 4);

        assert_eq!(memory.slice(5, 4), &[1, 2, 3, 4]);
    }

    #[test]
    fn set_data_zero_pads_past_the_source() {
        let mut memory = Memory::new();
        memory.resize(32);
        memory.set(0, &[0xff; 32]);
        memory.set_data(0, 2, 4, &[1, 2, 3, 4]);
        assert_eq!(memory.slice(0, 5), &[3, 4, 0, 0, 0xff]);
        memory.set_data(0, 100, 2, &[1, 2, 3, 4]);
        assert_eq!(memory.slice(0, 3), &[0, 0, 0]);
    }

    #[test]
    fn words() {
        assert_eq!(num_words(0), 0);
        assert_eq!(num_words(1), 1);
        assert_eq!(num_words(32), 1);
        assert_eq!(num_words(33), 2);
        assert_eq!(num_words(usize::MAX), usize::MAX / 32);
    }
}
