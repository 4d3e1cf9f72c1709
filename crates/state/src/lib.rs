//! Account and storage state.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

mod account;
mod account_info;

pub use account::{Account, AccountStatus, EvmStorageSlot};
pub use account_info::AccountInfo;
pub use bytecode::{self, Bytecode};
pub use primitives;

use primitives::{Address, HashMap, U256};

/// Loaded accounts, keyed by address. Also the shape of a per-call state diff.
pub type EvmState = HashMap<Address, Account>;

/// Structure used for EIP-1153 transient storage.
pub type TransientStorage = HashMap<(Address, U256), U256>;

/// An account's storage: slot key to slot.
pub type EvmStorage = HashMap<U256, EvmStorageSlot>;
