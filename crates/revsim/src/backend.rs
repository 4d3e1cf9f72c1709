//! Backing store under the account cache: empty, or a remote node pinned at one block.
use bytecode::Bytecode;
use core::fmt;
use database::{CacheDB, DatabaseRef, EmptyDBTyped};
use primitives::{Address, B256, U256};
use state::AccountInfo;

#[cfg(feature = "fork")]
use alloy_provider::{network::Ethereum, DynProvider};
#[cfg(feature = "fork")]
use database::AlloyDB;

/// Error of the backing store.
#[cfg(feature = "fork")]
pub type BackendError = database::ForkFetchError;

/// Error of the backing store. Without a fork nothing can fail.
#[cfg(not(feature = "fork"))]
pub type BackendError = core::convert::Infallible;

/// Database the facade executes against: the in-memory cache over a [`Backend`].
pub type EvmDb = CacheDB<Backend>;

/// Where accounts missing from the cache are read from.
pub enum Backend {
    /// Every account is absent, every slot is zero.
    Empty(EmptyDBTyped<BackendError>),
    /// Accounts and slots are fetched from a node, pinned at a block.
    #[cfg(feature = "fork")]
    Fork(Box<AlloyDB<Ethereum, DynProvider>>),
}

impl Backend {
    /// Backend without a fork.
    pub fn empty() -> Self {
        Self::Empty(EmptyDBTyped::new())
    }

    /// Returns `true` if state is read from a remote node.
    pub fn is_fork(&self) -> bool {
        !matches!(self, Self::Empty(_))
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty(_) => f.write_str("Empty"),
            #[cfg(feature = "fork")]
            Self::Fork(db) => f.debug_tuple("Fork").field(&db.block_id()).finish(),
        }
    }
}

impl DatabaseRef for Backend {
    type Error = BackendError;

    fn basic_ref(&self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        match self {
            Self::Empty(db) => db.basic_ref(address),
            #[cfg(feature = "fork")]
            Self::Fork(db) => db.basic_ref(address),
        }
    }

    fn code_by_hash_ref(&self, code_hash: B256) -> Result<Bytecode, Self::Error> {
        match self {
            Self::Empty(db) => db.code_by_hash_ref(code_hash),
            #[cfg(feature = "fork")]
            Self::Fork(db) => db.code_by_hash_ref(code_hash),
        }
    }

    fn storage_ref(&self, address: Address, index: U256) -> Result<U256, Self::Error> {
        match self {
            Self::Empty(db) => db.storage_ref(address, index),
            #[cfg(feature = "fork")]
            Self::Fork(db) => db.storage_ref(address, index),
        }
    }

    fn block_hash_ref(&self, number: u64) -> Result<B256, Self::Error> {
        match self {
            Self::Empty(db) => db.block_hash_ref(number),
            #[cfg(feature = "fork")]
            Self::Fork(db) => db.block_hash_ref(number),
        }
    }
}
