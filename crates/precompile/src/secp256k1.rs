//! `ecrecover` precompile, backed by [`k256`](https://crates.io/crates/k256).
//!
//! Input format:
//! [32 bytes for message][32 bytes for `v`][64 bytes for signature]
//!
//! Output format:
//! [32 bytes for recovered address], or no bytes when recovery fails.

use crate::{
    utilities::right_pad, PrecompileError, PrecompileOutput, PrecompileResult,
    PrecompileWithAddress,
};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use primitives::{keccak256, Bytes, B256};

/// `ecrecover` precompile, containing address and function to run.
pub const ECRECOVER: PrecompileWithAddress =
    PrecompileWithAddress(crate::u64_to_address(1), ec_recover_run);

/// Flat cost of every `ecrecover` call.
pub const ECRECOVER_BASE: u64 = 3_000;

/// `ecrecover` precompile function. Read more about input and output format in [this module docs](self).
pub fn ec_recover_run(input: &[u8], gas_limit: u64) -> PrecompileResult {
    if ECRECOVER_BASE > gas_limit {
        return Err(PrecompileError::OutOfGas);
    }

    let input = right_pad::<128>(input);

    // `v` must be a 32-byte big-endian integer equal to 27 or 28.
    if !(input[32..63].iter().all(|&b| b == 0) && matches!(input[63], 27 | 28)) {
        return Ok(PrecompileOutput::new(ECRECOVER_BASE, Bytes::new()));
    }

    let msg = B256::from_slice(&input[0..32]);
    let recid = input[63] - 27;
    let sig = &input[64..128];

    let out = ecrecover(sig, recid, &msg)
        .map(|address| Bytes::copy_from_slice(address.as_slice()))
        .unwrap_or_default();
    Ok(PrecompileOutput::new(ECRECOVER_BASE, out))
}

/// Recovers the signer of `msg` and returns its address left-padded to 32 bytes.
pub fn ecrecover(sig: &[u8], mut recid: u8, msg: &B256) -> Option<B256> {
    let mut sig = Signature::from_slice(sig).ok()?;

    // normalize signature and flip recovery id if needed.
    if let Some(sig_normalized) = sig.normalize_s() {
        sig = sig_normalized;
        recid ^= 1;
    }
    let recid = RecoveryId::from_byte(recid)?;

    let recovered_key = VerifyingKey::recover_from_prehash(&msg[..], &sig, recid).ok()?;
    let mut hash = keccak256(&recovered_key.to_encoded_point(false).as_bytes()[1..]);

    // truncate to 20 bytes
    hash[..12].fill(0);
    Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    fn signed_input(msg: B256) -> (Vec<u8>, B256) {
        let key = SigningKey::from_slice(&[0x42; 32]).unwrap();
        let (sig, recid) = key.sign_prehash_recoverable(msg.as_slice()).unwrap();

        let mut expected = keccak256(
            &key.verifying_key().to_encoded_point(false).as_bytes()[1..],
        );
        expected[..12].fill(0);

        let mut input = msg.to_vec();
        let mut v = [0u8; 32];
        v[31] = 27 + recid.to_byte();
        input.extend_from_slice(&v);
        input.extend_from_slice(&sig.to_bytes());
        (input, expected)
    }

    #[test]
    fn recovers_signer() {
        let (input, expected) = signed_input(keccak256(b"revsim"));
        let out = ec_recover_run(&input, 3_000).unwrap();
        assert_eq!(out.gas_used, ECRECOVER_BASE);
        assert_eq!(out.bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn invalid_v_returns_empty() {
        let (mut input, _) = signed_input(keccak256(b"revsim"));
        input[63] = 29;
        let out = ec_recover_run(&input, 3_000).unwrap();
        assert!(out.bytes.is_empty());
        assert_eq!(out.gas_used, ECRECOVER_BASE);

        let out = ec_recover_run(&[], 3_000).unwrap();
        assert!(out.bytes.is_empty());
    }

    #[test]
    fn out_of_gas() {
        assert_eq!(ec_recover_run(&[], 2_999), Err(PrecompileError::OutOfGas));
    }
}
