//! What a transaction produced, and why a transaction could not run at all.
use crate::JournalError;
use core::fmt;
use database_interface::DBErrorMarker;
use primitives::{Address, Bytes, Log, U256};
use state::EvmState;
use std::{boxed::Box, string::String, vec::Vec};

pub use interpreter::{HaltReason, OutOfGasError, SuccessReason};

/// [`ExecutionResult`] next to every account the transaction touched.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultAndState {
    /// How the transaction ended.
    pub result: ExecutionResult,
    /// Touched accounts as they are after the transaction.
    pub state: EvmState,
}

/// How an executed transaction ended.
///
/// `gas_used` is what the caller pays for: intrinsic gas included, refunds already deducted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionResult {
    /// `STOP`, `RETURN` or `SELFDESTRUCT` ended the top-level frame.
    Success {
        /// Instruction that ended the top-level frame.
        reason: SuccessReason,
        /// Gas charged to the caller.
        gas_used: u64,
        /// Refund already taken off `gas_used`.
        gas_refunded: u64,
        /// Logs of every frame that was kept, in emission order.
        logs: Vec<Log>,
        /// Returned bytes, plus the new address for creations.
        output: Output,
    },
    /// `REVERT` ended the top-level frame. Unused gas goes back to the caller.
    Revert {
        /// Gas charged to the caller.
        gas_used: u64,
        /// Revert payload.
        output: Bytes,
    },
    /// Exceptional halt. The whole gas limit is spent.
    Halt {
        /// What went wrong.
        reason: HaltReason,
        /// Gas charged to the caller, the transaction gas limit.
        gas_used: u64,
    },
}

impl ExecutionResult {
    /// `true` for [`Self::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// `true` for [`Self::Revert`].
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Revert { .. })
    }

    /// `true` for [`Self::Halt`].
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt { .. })
    }

    /// Address of the contract a successful creation deployed.
    pub fn created_address(&self) -> Option<Address> {
        match self {
            Self::Success {
                output: Output::Create(_, address),
                ..
            } => *address,
            _ => None,
        }
    }

    /// Returned or revert bytes. Halts have none.
    pub fn output(&self) -> Option<&Bytes> {
        match self {
            Self::Success { output, .. } => Some(output.data()),
            Self::Revert { output, .. } => Some(output),
            Self::Halt { .. } => None,
        }
    }

    /// Owned form of [`Self::output`].
    pub fn into_output(self) -> Option<Bytes> {
        match self {
            Self::Success { output, .. } => Some(output.into_data()),
            Self::Revert { output, .. } => Some(output),
            Self::Halt { .. } => None,
        }
    }

    /// Logs of a successful transaction. Failed ones keep none.
    pub fn logs(&self) -> &[Log] {
        match self {
            Self::Success { logs, .. } => logs,
            _ => &[],
        }
    }

    /// Gas charged to the caller.
    pub fn gas_used(&self) -> u64 {
        match self {
            Self::Success { gas_used, .. }
            | Self::Revert { gas_used, .. }
            | Self::Halt { gas_used, .. } => *gas_used,
        }
    }
}

/// Bytes returned by a successful top-level frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Output {
    /// Return data of a call.
    Call(Bytes),
    /// Bytes the init code returned, and where they were deployed.
    Create(Bytes, Option<Address>),
}

impl Output {
    /// Returned bytes.
    pub fn data(&self) -> &Bytes {
        let (Self::Call(data) | Self::Create(data, _)) = self;
        data
    }

    /// Owned form of [`Self::data`].
    pub fn into_data(self) -> Bytes {
        let (Self::Call(data) | Self::Create(data, _)) = self;
        data
    }

    /// Deployed address of a creation.
    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::Create(_, address) => address.as_ref(),
            Self::Call(_) => None,
        }
    }
}

/// Why a transaction produced no [`ExecutionResult`].
///
/// None of these leave state behind: the transaction checkpoint is reverted first.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EVMError<DBError> {
    /// The transaction does not fit the environment or the caller account.
    Transaction(InvalidTransaction),
    /// The block environment is incomplete for its hardfork.
    Header(InvalidHeader),
    /// The account store failed to answer.
    Database(DBError),
    /// A checkpoint was closed out of order.
    Journal(JournalError),
    /// Broken invariant of the execution loop.
    Custom(String),
}

impl<DBError: DBErrorMarker> From<DBError> for EVMError<DBError> {
    fn from(value: DBError) -> Self {
        Self::Database(value)
    }
}

impl<DBError> From<InvalidTransaction> for EVMError<DBError> {
    fn from(value: InvalidTransaction) -> Self {
        Self::Transaction(value)
    }
}

impl<DBError> From<InvalidHeader> for EVMError<DBError> {
    fn from(value: InvalidHeader) -> Self {
        Self::Header(value)
    }
}

impl<DBError> From<JournalError> for EVMError<DBError> {
    fn from(value: JournalError) -> Self {
        Self::Journal(value)
    }
}

impl<DBError: fmt::Display> fmt::Display for EVMError<DBError> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction(e) => write!(f, "invalid transaction: {e}"),
            Self::Header(e) => write!(f, "invalid block environment: {e}"),
            Self::Database(e) => write!(f, "account store: {e}"),
            Self::Journal(e) => write!(f, "journal: {e}"),
            Self::Custom(e) => f.write_str(e),
        }
    }
}

impl<DBError> core::error::Error for EVMError<DBError>
where
    DBError: core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Transaction(e) => Some(e),
            Self::Header(e) => Some(e),
            Self::Database(e) => Some(e),
            Self::Journal(e) => Some(e),
            Self::Custom(_) => None,
        }
    }
}

/// Reasons a transaction is rejected before it executes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvalidTransaction {
    /// `gas_priority_fee` is above `gas_price`.
    PriorityFeeGreaterThanMaxFee,
    /// `gas_price` is below the block base fee.
    GasPriceLessThanBasefee,
    /// `gas_limit` is above the block gas limit.
    CallerGasLimitMoreThanBlock,
    /// Intrinsic gas does not fit in `gas_limit`.
    CallGasCostMoreThanGasLimit {
        /// Intrinsic gas of the transaction.
        initial_gas: u64,
        /// Gas limit of the transaction.
        gas_limit: u64,
    },
    /// EIP-3607: the caller has code.
    RejectCallerWithCode,
    /// The caller can not pay `value + gas_limit * gas_price` and the blob fee.
    LackOfFundForMaxFee {
        /// Most the transaction can cost.
        fee: Box<U256>,
        /// What the caller has.
        balance: Box<U256>,
    },
    /// `value + gas_limit * gas_price` does not fit in 256 bits.
    OverflowPaymentInTransaction,
    /// The caller nonce is `u64::MAX`.
    NonceOverflowInTransaction,
    /// The transaction nonce is ahead of the caller.
    NonceTooHigh {
        /// Transaction nonce.
        tx: u64,
        /// Caller nonce.
        state: u64,
    },
    /// The transaction nonce is behind the caller.
    NonceTooLow {
        /// Transaction nonce.
        tx: u64,
        /// Caller nonce.
        state: u64,
    },
    /// EIP-3860: init code longer than twice the code size limit.
    CreateInitCodeSizeLimit,
    /// `chain_id` differs from the configured chain.
    InvalidChainId,
    /// Access list before Berlin.
    AccessListNotSupported,
    /// `max_fee_per_blob_gas` before Cancun.
    MaxFeePerBlobGasNotSupported,
    /// Blob hashes before Cancun.
    BlobVersionedHashesNotSupported,
    /// The block blob gas price is above `max_fee_per_blob_gas`.
    BlobGasPriceGreaterThanMax,
    /// A blob transaction without blobs.
    EmptyBlobs,
    /// A blob transaction has no `to`.
    BlobCreateTransaction,
    /// More blobs than a block holds.
    TooManyBlobs {
        /// Blobs a block holds.
        max: usize,
        /// Blobs in the transaction.
        have: usize,
    },
    /// A blob hash with a version other than KZG.
    BlobVersionNotSupported,
}

impl core::error::Error for InvalidTransaction {}

impl fmt::Display for InvalidTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::CallGasCostMoreThanGasLimit {
                initial_gas,
                gas_limit,
            } => return write!(f, "intrinsic gas {initial_gas} above gas limit {gas_limit}"),
            Self::LackOfFundForMaxFee { fee, balance } => {
                return write!(f, "balance {balance} can not cover {fee}")
            }
            Self::NonceTooHigh { tx, state } => {
                return write!(f, "nonce {tx} ahead of account nonce {state}")
            }
            Self::NonceTooLow { tx, state } => {
                return write!(f, "nonce {tx} behind account nonce {state}")
            }
            Self::TooManyBlobs { max, have } => {
                return write!(f, "{have} blobs, a block holds {max}")
            }
            Self::PriorityFeeGreaterThanMaxFee => "priority fee above max fee",
            Self::GasPriceLessThanBasefee => "gas price below base fee",
            Self::CallerGasLimitMoreThanBlock => "gas limit above block gas limit",
            Self::RejectCallerWithCode => "caller has code",
            Self::OverflowPaymentInTransaction => "payment overflows",
            Self::NonceOverflowInTransaction => "caller nonce overflows",
            Self::CreateInitCodeSizeLimit => "init code too large",
            Self::InvalidChainId => "chain id mismatch",
            Self::AccessListNotSupported => "access list before Berlin",
            Self::MaxFeePerBlobGasNotSupported => "blob fee before Cancun",
            Self::BlobVersionedHashesNotSupported => "blob hashes before Cancun",
            Self::BlobGasPriceGreaterThanMax => "blob gas price above max fee per blob gas",
            Self::EmptyBlobs => "blob transaction without blobs",
            Self::BlobCreateTransaction => "blob transaction without a target",
            Self::BlobVersionNotSupported => "unsupported blob hash version",
        };
        f.write_str(msg)
    }
}

/// Block environment fields a hardfork requires but that are unset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvalidHeader {
    /// `prevrandao` from the Merge on.
    PrevrandaoNotSet,
    /// `blob_excess_gas_and_price` from Cancun on.
    ExcessBlobGasNotSet,
}

impl core::error::Error for InvalidHeader {}

impl fmt::Display for InvalidHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PrevrandaoNotSet => "prevrandao not set",
            Self::ExcessBlobGasNotSet => "excess blob gas not set",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[test]
    fn lack_of_funds_debug_form() {
        let err: EVMError<Infallible> = InvalidTransaction::LackOfFundForMaxFee {
            fee: Box::new(U256::from(10)),
            balance: Box::new(U256::from(1)),
        }
        .into();
        let debug = format!("{err:?}");
        assert!(debug.starts_with("Transaction(LackOfFundForMaxFee"), "{debug}");
        assert_eq!(
            err.to_string(),
            "invalid transaction: balance 1 can not cover 10"
        );
    }

    #[test]
    fn journal_errors_keep_their_source() {
        let err: EVMError<Infallible> = JournalError::StaleCheckpoint(4).into();
        assert_eq!(err.to_string(), "journal: checkpoint 4 is not open");
        assert!(core::error::Error::source(&err).is_some());
    }

    #[test]
    fn result_accessors() {
        let created = Address::with_last_byte(7);
        let success = ExecutionResult::Success {
            reason: SuccessReason::Return,
            gas_used: 21_000,
            gas_refunded: 0,
            logs: vec![],
            output: Output::Create(Bytes::from_static(&[1]), Some(created)),
        };
        assert!(success.is_success());
        assert_eq!(success.created_address(), Some(created));
        assert_eq!(success.output(), Some(&Bytes::from_static(&[1])));

        let halt = ExecutionResult::Halt {
            reason: HaltReason::OpcodeNotFound,
            gas_used: 100,
        };
        assert!(halt.is_halt());
        assert_eq!(halt.output(), None);
        assert_eq!(halt.gas_used(), 100);
        assert!(halt.logs().is_empty());
    }
}
