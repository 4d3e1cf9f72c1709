use super::calc_linear_cost_u32;
use crate::{PrecompileError, PrecompileOutput, PrecompileResult, PrecompileWithAddress};
use primitives::Bytes;

/// `identity` precompile at address `0x04`.
pub const FUN: PrecompileWithAddress =
    PrecompileWithAddress(crate::u64_to_address(4), identity_run);

/// The base cost of the operation.
pub const IDENTITY_BASE: u64 = 15;
/// The cost per word.
pub const IDENTITY_PER_WORD: u64 = 3;

/// Takes the input bytes, copies them, and returns it as the output.
///
/// See: <https://etherscan.io/address/0000000000000000000000000000000000000004>
pub fn identity_run(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let gas_used = calc_linear_cost_u32(input.len(), IDENTITY_BASE, IDENTITY_PER_WORD);
    if gas_used > gas_limit {
        return Err(PrecompileError::OutOfGas);
    }
    Ok(PrecompileOutput::new(
        gas_used,
        Bytes::copy_from_slice(input),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_input() {
        let input = [7u8; 40];
        let out = identity_run(&input, 21).unwrap();
        assert_eq!(out.gas_used, 21);
        assert_eq!(out.bytes.as_ref(), &input[..]);
    }

    #[test]
    fn out_of_gas() {
        assert_eq!(identity_run(&[], 14), Err(PrecompileError::OutOfGas));
        assert_eq!(identity_run(&[], 15).unwrap().bytes, Bytes::new());
    }
}
