//! # revsim-context
//!
//! Everything a transaction executes against: the block, transaction and configuration
//! environment, the checkpointed [`JournaledState`] and the [`Context`] that exposes both to the
//! interpreter as its [`Host`](interpreter::Host).
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

pub mod block;
pub mod cfg;
pub mod context;
pub mod env;
pub mod journaled_state;
pub mod result;
pub mod tx;

pub use block::{BlobExcessGasAndPrice, BlockEnv};
pub use cfg::CfgEnv;
pub use context::Context;
pub use env::Env;
pub use journaled_state::{
    JournalCheckpoint, JournalEntry, JournalError, JournaledState, TransferError,
};
pub use result::{
    EVMError, ExecutionResult, HaltReason, InvalidHeader, InvalidTransaction, OutOfGasError,
    Output, ResultAndState, SuccessReason,
};
pub use tx::{AccessList, AccessListItem, TxEnv};
