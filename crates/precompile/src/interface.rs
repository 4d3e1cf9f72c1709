//! What a precompile returns.
use core::fmt;
use primitives::Bytes;

/// Output or failure of one precompile run.
pub type PrecompileResult = Result<PrecompileOutput, PrecompileError>;

/// A precompile: takes the call input and the gas the caller forwarded.
pub type PrecompileFn = fn(&[u8], u64) -> PrecompileResult;

/// Successful run: gas to charge the frame and the returned bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrecompileOutput {
    /// Gas charged, never more than the limit the precompile was called with.
    pub gas_used: u64,
    /// Return data of the call.
    pub bytes: Bytes,
}

impl PrecompileOutput {
    /// Output that charges `gas_used` and returns `bytes`.
    pub fn new(gas_used: u64, bytes: Bytes) -> Self {
        Self { gas_used, bytes }
    }
}

/// Failed run. The frame halts and keeps none of its gas.
///
/// Malformed input is not an error: `ecrecover` answers it with empty output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrecompileError {
    /// The forwarded gas does not cover the price of the input.
    OutOfGas,
}

impl core::error::Error for PrecompileError {}

impl fmt::Display for PrecompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfGas => f.write_str("precompile out of gas"),
        }
    }
}
