//! Conversions between stack words and the hashes and addresses they carry.
use primitives::{Address, B256, U256};

/// Values that fit in one stack word.
pub trait IntoU256 {
    /// Big-endian word of the value, zero-extended on the left.
    fn into_u256(self) -> U256;
}

impl IntoU256 for B256 {
    fn into_u256(self) -> U256 {
        U256::from_be_bytes(self.0)
    }
}

impl IntoU256 for Address {
    fn into_u256(self) -> U256 {
        U256::from_be_slice(self.as_slice())
    }
}

/// Stack words used as addresses. Only the low 20 bytes count.
pub trait IntoAddress {
    /// Address in the low 20 bytes of the word.
    fn into_address(self) -> Address;
}

impl IntoAddress for U256 {
    fn into_address(self) -> Address {
        let word = self.to_be_bytes::<32>();
        Address::from_slice(&word[12..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::{address, b256};

    #[test]
    fn address_words_ignore_high_bytes() {
        let addr = address!("0x00000000000000000000000000000000000000ff");
        let word = addr.into_u256();
        assert_eq!(word, U256::from(0xffu64));

        let dirty = word | (U256::from(1u64) << 200usize);
        assert_eq!(dirty.into_address(), addr);
    }

    #[test]
    fn hash_words_keep_every_byte() {
        let hash = b256!("0x0102030405060708091011121314151617181920212223242526272829303132");
        let word = hash.into_u256();
        assert_eq!(word.to_be_bytes::<32>(), hash.0);
        assert_eq!(
            word.into_address(),
            address!("0x1314151617181920212223242526272829303132")
        );
    }
}
