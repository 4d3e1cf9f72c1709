//! `SHA2-256` and `RIPEMD-160` precompiles.
use super::calc_linear_cost_u32;
use crate::{PrecompileError, PrecompileOutput, PrecompileResult, PrecompileWithAddress};
use primitives::Bytes;
use sha2::Digest as _;

/// `sha256` precompile at address `0x02`.
pub const SHA256: PrecompileWithAddress =
    PrecompileWithAddress(crate::u64_to_address(2), sha256_run);

/// `ripemd160` precompile at address `0x03`.
pub const RIPEMD160: PrecompileWithAddress =
    PrecompileWithAddress(crate::u64_to_address(3), ripemd160_run);

/// Computes the SHA-256 hash of the input data.
///
/// See: <https://etherscan.io/address/0000000000000000000000000000000000000002>
pub fn sha256_run(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let cost = calc_linear_cost_u32(input.len(), 60, 12);
    if cost > gas_limit {
        return Err(PrecompileError::OutOfGas);
    }
    let output = sha2::Sha256::digest(input);
    Ok(PrecompileOutput::new(cost, Bytes::copy_from_slice(&output)))
}

/// Computes the RIPEMD-160 hash of the input data, left-padded to 32 bytes.
///
/// See: <https://etherscan.io/address/0000000000000000000000000000000000000003>
pub fn ripemd160_run(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let gas_used = calc_linear_cost_u32(input.len(), 600, 120);
    if gas_used > gas_limit {
        return Err(PrecompileError::OutOfGas);
    }
    let mut hasher = ripemd::Ripemd160::new();
    hasher.update(input);

    let mut output = [0u8; 32];
    hasher.finalize_into((&mut output[12..]).into());
    Ok(PrecompileOutput::new(gas_used, Bytes::copy_from_slice(&output)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::hex;

    #[test]
    fn sha256_of_abc() {
        let out = sha256_run(b"abc", 72).unwrap();
        assert_eq!(out.gas_used, 72);
        assert_eq!(
            out.bytes.as_ref(),
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(sha256_run(b"abc", 71), Err(PrecompileError::OutOfGas));
    }

    #[test]
    fn ripemd160_is_left_padded() {
        let out = ripemd160_run(&[], 600).unwrap();
        assert_eq!(out.gas_used, 600);
        assert_eq!(
            out.bytes.as_ref(),
            hex!("0000000000000000000000009c1185a5c5e9fc54612808977ee8f548b2258d31")
        );
        assert_eq!(ripemd160_run(&[0; 33], 839), Err(PrecompileError::OutOfGas));
    }
}
