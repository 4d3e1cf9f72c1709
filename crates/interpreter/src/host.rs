mod dummy;

pub use dummy::DummyHost;

use auto_impl::auto_impl;
use primitives::{Address, Bytes, Log, B256, U256};

/// EVM context host.
///
/// Getters read the block and transaction environment. State methods return [`None`] when the
/// database failed; the host keeps the error and the interpreter halts with
/// [`FatalExternalError`](crate::InstructionResult::FatalExternalError).
#[auto_impl(&mut, Box)]
pub trait Host {
    /// Block base fee.
    fn basefee(&self) -> U256;
    /// EIP-4844 blob gas price, zero before Cancun.
    fn blob_gasprice(&self) -> U256;
    /// Block gas limit.
    fn gas_limit(&self) -> U256;
    /// Block difficulty.
    fn difficulty(&self) -> U256;
    /// `PREVRANDAO`, set after the merge.
    fn prevrandao(&self) -> Option<B256>;
    /// Block number.
    fn block_number(&self) -> u64;
    /// Block timestamp.
    fn timestamp(&self) -> U256;
    /// Block beneficiary.
    fn beneficiary(&self) -> Address;
    /// Chain id.
    fn chain_id(&self) -> U256;
    /// Price per unit of gas paid by the transaction.
    fn effective_gas_price(&self) -> U256;
    /// Transaction origin.
    fn caller(&self) -> Address;
    /// Versioned hash of the blob at `number`.
    fn blob_hash(&self, number: usize) -> Option<U256>;
    /// Maximum initcode size accepted by `CREATE` and `CREATE2`.
    fn max_initcode_size(&self) -> usize;

    /// Get the block hash of the given block `number`.
    fn block_hash(&mut self, number: u64) -> Option<B256>;

    /// Load an account, warming it up.
    fn load_account(&mut self, address: Address) -> Option<AccountLoad>;

    /// Get balance of `address` and if the account is cold.
    fn balance(&mut self, address: Address) -> Option<StateLoad<U256>>;

    /// Get code of `address` and if the account is cold.
    fn code(&mut self, address: Address) -> Option<StateLoad<Bytes>>;

    /// Get code hash of `address` and if the account is cold.
    ///
    /// Empty accounts hash to zero.
    fn code_hash(&mut self, address: Address) -> Option<StateLoad<B256>>;

    /// Get storage value of `address` at `index` and if the account is cold.
    fn sload(&mut self, address: Address, index: U256) -> Option<StateLoad<U256>>;

    /// Set storage value of account address at index.
    ///
    /// Returns the original, present and new value together with the slot's coldness.
    fn sstore(
        &mut self,
        address: Address,
        index: U256,
        value: U256,
    ) -> Option<StateLoad<SStoreResult>>;

    /// Get the transient storage value of `address` at `index`.
    fn tload(&mut self, address: Address, index: U256) -> U256;

    /// Set the transient storage value of `address` at `index`.
    fn tstore(&mut self, address: Address, index: U256, value: U256);

    /// Emit a log owned by `address` with given `LogData`.
    fn log(&mut self, log: Log);

    /// Mark `address` to be deleted, with funds transferred to `target`.
    fn selfdestruct(
        &mut self,
        address: Address,
        target: Address,
    ) -> Option<StateLoad<SelfDestructResult>>;
}

/// Warm/cold status of an account load together with its emptiness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountLoad {
    /// Is account cold loaded
    pub is_cold: bool,
    /// Is account empty, if true account is not created.
    pub is_empty: bool,
}

/// State load information that contains the data and if the account or storage is cold loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateLoad<T> {
    /// Returned data
    pub data: T,
    /// Is account is cold loaded
    pub is_cold: bool,
}

impl<T> StateLoad<T> {
    /// Returns a new [`StateLoad`] with the given data and cold load status.
    pub fn new(data: T, is_cold: bool) -> Self {
        Self { data, is_cold }
    }

    /// Maps the data of the [`StateLoad`] to a new value.
    pub fn map<B, F>(self, f: F) -> StateLoad<B>
    where
        F: FnOnce(T) -> B,
    {
        StateLoad::new(f(self.data), self.is_cold)
    }
}

impl<T: Copy> Copy for StateLoad<T> {}

/// Represents the result of an `sstore` operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SStoreResult {
    /// Value of the storage when it is first read
    pub original_value: U256,
    /// Current value of the storage
    pub present_value: U256,
    /// New value that is set
    pub new_value: U256,
}

impl SStoreResult {
    /// Returns `true` if the new value is equal to the present value.
    #[inline]
    pub fn is_new_eq_present(&self) -> bool {
        self.new_value == self.present_value
    }

    /// Returns `true` if the original value is equal to the present value.
    #[inline]
    pub fn is_original_eq_present(&self) -> bool {
        self.original_value == self.present_value
    }

    /// Returns `true` if the original value is equal to the new value.
    #[inline]
    pub fn is_original_eq_new(&self) -> bool {
        self.original_value == self.new_value
    }

    /// Returns `true` if the original value is zero.
    #[inline]
    pub fn is_original_zero(&self) -> bool {
        self.original_value.is_zero()
    }

    /// Returns `true` if the present value is zero.
    #[inline]
    pub fn is_present_zero(&self) -> bool {
        self.present_value.is_zero()
    }

    /// Returns `true` if the new value is zero.
    #[inline]
    pub fn is_new_zero(&self) -> bool {
        self.new_value.is_zero()
    }
}

/// Result of a selfdestruct action.
///
/// Value returned are needed to calculate the gas spent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelfDestructResult {
    /// The destroyed account held a balance.
    pub had_value: bool,
    /// The beneficiary existed before the call.
    pub target_exists: bool,
    /// The account was already marked as destroyed in this transaction.
    pub previously_destroyed: bool,
}
