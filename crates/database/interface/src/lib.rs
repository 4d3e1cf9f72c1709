//! Traits the journal and the account cache read and write state through.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

use auto_impl::auto_impl;
use core::convert::Infallible;
use primitives::{Address, HashMap, B256, U256};
use state::{Account, AccountInfo, Bytecode};

pub mod empty_db;

pub use empty_db::{EmptyDB, EmptyDBTyped};

/// Errors a store may return. `EVMError` wraps them as its `Database` variant.
pub trait DBErrorMarker: core::error::Error + Send + Sync + 'static {}

impl DBErrorMarker for Infallible {}

/// State the journal loads accounts, code, slots and block hashes from.
///
/// Loads may fill a cache, hence `&mut self`.
#[auto_impl(&mut, Box)]
pub trait Database {
    /// Error of a failed load.
    type Error: DBErrorMarker;

    /// Account at `address`, `None` if it does not exist.
    fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error>;

    /// Code with the given hash.
    fn code_by_hash(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error>;

    /// Value of slot `index` of `address`. Missing slots are zero.
    fn storage(&mut self, address: Address, index: U256) -> Result<U256, Self::Error>;

    /// Hash of block `number`.
    fn block_hash(&mut self, number: u64) -> Result<B256, Self::Error>;
}

/// Receives the accounts a committing transaction touched.
#[auto_impl(&mut, Box)]
pub trait DatabaseCommit {
    /// Writes `changes` into the store.
    fn commit(&mut self, changes: HashMap<Address, Account>);
}

/// Read-only store under the account cache: the empty backend or a pinned fork.
#[auto_impl(&, Box, Arc)]
pub trait DatabaseRef {
    /// Error of a failed read.
    type Error: DBErrorMarker;

    /// Account at `address`, `None` if it does not exist.
    fn basic_ref(&self, address: Address) -> Result<Option<AccountInfo>, Self::Error>;

    /// Code with the given hash.
    fn code_by_hash_ref(&self, code_hash: B256) -> Result<Bytecode, Self::Error>;

    /// Value of slot `index` of `address`.
    fn storage_ref(&self, address: Address, index: U256) -> Result<U256, Self::Error>;

    /// Hash of block `number`.
    fn block_hash_ref(&self, number: u64) -> Result<B256, Self::Error>;
}
