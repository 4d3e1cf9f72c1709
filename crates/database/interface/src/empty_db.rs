//! Store with no accounts.
use crate::{DBErrorMarker, DatabaseRef};
use core::{convert::Infallible, fmt, marker::PhantomData};
use primitives::{keccak256, Address, B256, U256};
use state::{AccountInfo, Bytecode};
use std::string::ToString;

/// [`EmptyDBTyped`] that can not fail.
pub type EmptyDB = EmptyDBTyped<Infallible>;

/// Backing store of a simulation that is not forked.
///
/// No account exists and every slot reads as zero. `E` only fixes the error type so the store can
/// stand in for a fallible backend.
pub struct EmptyDBTyped<E>(PhantomData<fn() -> E>);

impl<E> EmptyDBTyped<E> {
    /// Creates the store.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Clone for EmptyDBTyped<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EmptyDBTyped<E> {}

impl<E> Default for EmptyDBTyped<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EmptyDBTyped<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EmptyDB")
    }
}

impl<E: DBErrorMarker> DatabaseRef for EmptyDBTyped<E> {
    type Error = E;

    fn basic_ref(&self, _address: Address) -> Result<Option<AccountInfo>, E> {
        Ok(None)
    }

    fn code_by_hash_ref(&self, _code_hash: B256) -> Result<Bytecode, E> {
        Ok(Bytecode::default())
    }

    fn storage_ref(&self, _address: Address, _index: U256) -> Result<U256, E> {
        Ok(U256::ZERO)
    }

    /// `keccak256` of the block number written in decimal, so `BLOCKHASH` is stable across runs.
    fn block_hash_ref(&self, number: u64) -> Result<B256, E> {
        Ok(keccak256(number.to_string().as_bytes()))
    }
}
