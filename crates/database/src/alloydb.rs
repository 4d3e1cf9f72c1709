//! Fork-backed loader: reads remote state at a pinned block through an alloy [`Provider`].
pub use alloy_eips::BlockId;

use alloy_eips::BlockNumberOrTag;
use alloy_provider::{
    network::{
        primitives::HeaderResponse, BlockResponse, Ethereum,
    },
    Network, Provider,
};
use alloy_transport::TransportError;
use bytecode::Bytecode;
use core::{fmt, future::IntoFuture, marker::PhantomData};
use database_interface::{DBErrorMarker, DatabaseRef};
use primitives::{Address, B256, U256};
use state::AccountInfo;
use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tracing::debug;

/// Failure to read remote state. Never replaced by a default value.
#[derive(Debug)]
pub enum ForkFetchError {
    /// The RPC call failed.
    Transport(TransportError),
    /// The node does not know the requested block.
    BlockNotFound(BlockId),
    /// Code was requested by a hash that was never delivered with an account.
    CodeNotFound(B256),
    /// No Tokio runtime could be built to drive the request.
    Runtime(std::io::Error),
}

impl fmt::Display for ForkFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ForkFetchFailed: ")?;
        match self {
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::BlockNotFound(block) => write!(f, "block {block} not found"),
            Self::CodeNotFound(hash) => write!(f, "code for hash {hash} not found"),
            Self::Runtime(err) => write!(f, "failed to start runtime: {err}"),
        }
    }
}

impl core::error::Error for ForkFetchError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Runtime(err) => Some(err),
            _ => None,
        }
    }
}

impl DBErrorMarker for ForkFetchError {}

impl From<TransportError> for ForkFetchError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

impl From<std::io::Error> for ForkFetchError {
    fn from(err: std::io::Error) -> Self {
        Self::Runtime(err)
    }
}

/// Header fields of the pinned block, used to seed the block environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForkBlock {
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: B256,
    /// Block timestamp.
    pub timestamp: u64,
    /// Fee recipient.
    pub coinbase: Address,
    /// Block gas limit.
    pub gas_limit: u64,
    /// EIP-1559 base fee, zero before London.
    pub basefee: u64,
    /// Difficulty, zero after the merge.
    pub difficulty: U256,
    /// `mix_hash`, which carries `PREVRANDAO` after the merge.
    pub prevrandao: B256,
    /// EIP-4844 excess blob gas, if the block has it.
    pub excess_blob_gas: Option<u64>,
    /// Chain id reported by the node.
    pub chain_id: u64,
}

/// An alloy-powered [`DatabaseRef`].
///
/// Every query is made against one pinned block. Wrap it in a
/// [`CacheDB`](crate::CacheDB) to memoize the results.
#[derive(Debug)]
pub struct AlloyDB<N: Network, P: Provider<N>> {
    /// The provider to fetch the data from.
    provider: P,
    /// The block the queries are based on.
    block_id: BlockId,
    _marker: PhantomData<fn() -> N>,
}

impl<N: Network, P: Provider<N>> AlloyDB<N, P> {
    /// Creates a loader for the given block as is. Tags such as `latest` are re-resolved by the
    /// node on every query, see [`Self::pinned`].
    pub fn new(provider: P, block_id: BlockId) -> Self {
        Self {
            provider,
            block_id,
            _marker: PhantomData,
        }
    }

    /// Creates a loader pinned to a concrete block: tags are resolved once, here.
    pub fn pinned(provider: P, block_id: BlockId) -> Result<Self, ForkFetchError> {
        let block_id = match block_id {
            BlockId::Hash(_) | BlockId::Number(BlockNumberOrTag::Number(_)) => block_id,
            BlockId::Number(BlockNumberOrTag::Earliest) => BlockId::number(0),
            BlockId::Number(BlockNumberOrTag::Latest | BlockNumberOrTag::Pending) => {
                BlockId::number(block_on(provider.get_block_number())??)
            }
            BlockId::Number(tag) => {
                let block = block_on(provider.get_block_by_number(tag))??
                    .ok_or(ForkFetchError::BlockNotFound(block_id))?;
                BlockId::hash(block.header().hash())
            }
        };
        debug!(target: "revsim::fork", %block_id, "pinned fork block");
        Ok(Self::new(provider, block_id))
    }

    /// The block the queries are based on.
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    /// Set the block the queries are based on.
    pub fn set_block_id(&mut self, block_id: BlockId) {
        self.block_id = block_id;
    }
}

impl<P: Provider<Ethereum>> AlloyDB<Ethereum, P> {
    /// Reads the pinned header and the chain id.
    pub fn fetch_block_env(&self) -> Result<ForkBlock, ForkFetchError> {
        let (block, chain_id) = block_on(async {
            let block = self.provider.get_block(self.block_id).await;
            let chain_id = self.provider.get_chain_id().await;
            (block, chain_id)
        })?;
        let block = block?.ok_or(ForkFetchError::BlockNotFound(self.block_id))?;
        let header = &block.header;

        Ok(ForkBlock {
            number: header.number,
            hash: header.hash,
            timestamp: header.timestamp,
            coinbase: header.beneficiary,
            gas_limit: header.gas_limit,
            basefee: header.base_fee_per_gas.unwrap_or_default(),
            difficulty: header.difficulty,
            prevrandao: header.mix_hash,
            excess_blob_gas: header.excess_blob_gas,
            chain_id: chain_id?,
        })
    }
}

impl<N: Network, P: Provider<N>> DatabaseRef for AlloyDB<N, P> {
    type Error = ForkFetchError;

    fn basic_ref(&self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        debug!(target: "revsim::fork", %address, "fetching account");
        let (nonce, balance, code) = block_on(async {
            let nonce = self
                .provider
                .get_transaction_count(address)
                .block_id(self.block_id);
            let balance = self.provider.get_balance(address).block_id(self.block_id);
            let code = self.provider.get_code_at(address).block_id(self.block_id);
            tokio::join!(nonce, balance, code)
        })?;

        let code = Bytecode::new_raw(code?);
        Ok(Some(AccountInfo::new(balance?, nonce?, code)))
    }

    fn code_by_hash_ref(&self, code_hash: B256) -> Result<Bytecode, Self::Error> {
        // Code always arrives with its account in `basic_ref`.
        Err(ForkFetchError::CodeNotFound(code_hash))
    }

    fn storage_ref(&self, address: Address, index: U256) -> Result<U256, Self::Error> {
        debug!(target: "revsim::fork", %address, %index, "fetching storage slot");
        let value = block_on(
            self.provider
                .get_storage_at(address, index)
                .block_id(self.block_id),
        )??;
        Ok(value)
    }

    fn block_hash_ref(&self, number: u64) -> Result<B256, Self::Error> {
        debug!(target: "revsim::fork", number, "fetching block hash");
        let block = block_on(self.provider.get_block_by_number(number.into()))??
            .ok_or(ForkFetchError::BlockNotFound(BlockId::number(number)))?;
        Ok(block.header().hash())
    }
}

/// Drives `f` to completion from synchronous code, inside or outside a Tokio runtime.
fn block_on<F>(f: F) -> Result<F::Output, ForkFetchError>
where
    F: IntoFuture,
    F::IntoFuture: Send,
    F::Output: Send,
{
    let f = f.into_future();
    match Handle::try_current() {
        Ok(handle) => match handle.runtime_flavor() {
            // `block_in_place` panics on a current-thread runtime, so run on a scoped thread
            // with its own runtime instead.
            RuntimeFlavor::CurrentThread => std::thread::scope(move |s| {
                let worker = s.spawn(move || {
                    let runtime = Builder::new_current_thread().enable_all().build()?;
                    Ok::<_, ForkFetchError>(runtime.block_on(f))
                });
                match worker.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }),
            _ => Ok(tokio::task::block_in_place(move || handle.block_on(f))),
        },
        Err(_) => {
            let runtime = Builder::new_current_thread().enable_all().build()?;
            Ok(runtime.block_on(f))
        }
    }
}
