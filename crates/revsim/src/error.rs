use crate::backend::BackendError;
use context::{EVMError, HaltReason, JournalError};
use core::fmt;
use primitives::Bytes;

/// Failure of a facade operation.
#[derive(Debug)]
pub enum CallError {
    /// The transaction was rejected or execution failed outside the interpreter.
    Evm(EVMError<BackendError>),
    /// Execution reverted. Raised by strict instances and by deployments.
    Reverted {
        /// Revert data.
        output: Bytes,
        /// Gas used by the transaction.
        gas_used: u64,
    },
    /// Execution halted. Raised by strict instances and by deployments.
    Halted {
        /// Halt reason.
        reason: HaltReason,
        /// Gas used by the transaction, equal to its gas limit.
        gas_used: u64,
    },
    /// A snapshot handle was used after it was closed.
    Journal(JournalError),
    /// Remote state could not be read.
    #[cfg(feature = "fork")]
    Fork(database::ForkFetchError),
    /// An option given at construction could not be used.
    InvalidOption(String),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug form keeps the variant name, e.g. `Transaction(LackOfFundForMaxFee { .. })`.
            Self::Evm(err) => write!(f, "{err:?}"),
            Self::Reverted { output, gas_used } => {
                write!(f, "execution reverted after {gas_used} gas: {output}")
            }
            Self::Halted { reason, gas_used } => {
                write!(f, "execution halted after {gas_used} gas: {reason:?}")
            }
            Self::Journal(err) => err.fmt(f),
            #[cfg(feature = "fork")]
            Self::Fork(err) => err.fmt(f),
            Self::InvalidOption(msg) => write!(f, "invalid option: {msg}"),
        }
    }
}

impl core::error::Error for CallError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Journal(err) => Some(err),
            #[cfg(feature = "fork")]
            Self::Fork(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EVMError<BackendError>> for CallError {
    fn from(err: EVMError<BackendError>) -> Self {
        Self::Evm(err)
    }
}

impl From<JournalError> for CallError {
    fn from(err: JournalError) -> Self {
        Self::Journal(err)
    }
}

#[cfg(feature = "fork")]
impl From<database::ForkFetchError> for CallError {
    fn from(err: database::ForkFetchError) -> Self {
        Self::Fork(err)
    }
}

#[cfg(not(feature = "fork"))]
impl From<core::convert::Infallible> for CallError {
    fn from(err: core::convert::Infallible) -> Self {
        match err {}
    }
}
