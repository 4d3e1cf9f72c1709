use crate::{AccountLoad, Host, SStoreResult, SelfDestructResult, StateLoad};
use primitives::{
    hash_map::Entry, keccak256, Address, Bytes, HashMap, Log, B256, MAX_INITCODE_SIZE, U256,
};
use std::vec::Vec;

/// A dummy [Host] implementation.
///
/// Every account is empty and warm, storage is a single map shared by all addresses.
/// Block hashes are the Keccak-256 hash of the big-endian block number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DummyHost {
    /// Block number returned to `NUMBER` and used by `BLOCKHASH`.
    pub block_number: u64,
    /// Chain id returned to `CHAINID`.
    pub chain_id: u64,
    /// Storage of every address.
    pub storage: HashMap<U256, U256>,
    /// Transient storage of every address.
    pub transient_storage: HashMap<U256, U256>,
    /// Emitted logs.
    pub log: Vec<Log>,
}

impl DummyHost {
    /// Clears the storage and logs of the dummy host.
    #[inline]
    pub fn clear(&mut self) {
        self.storage.clear();
        self.transient_storage.clear();
        self.log.clear();
    }
}

impl Host for DummyHost {
    fn basefee(&self) -> U256 {
        U256::ZERO
    }

    fn blob_gasprice(&self) -> U256 {
        U256::ZERO
    }

    fn gas_limit(&self) -> U256 {
        U256::from(u64::MAX)
    }

    fn difficulty(&self) -> U256 {
        U256::ZERO
    }

    fn prevrandao(&self) -> Option<B256> {
        Some(B256::ZERO)
    }

    fn block_number(&self) -> u64 {
        self.block_number
    }

    fn timestamp(&self) -> U256 {
        U256::from(1)
    }

    fn beneficiary(&self) -> Address {
        Address::ZERO
    }

    fn chain_id(&self) -> U256 {
        U256::from(self.chain_id)
    }

    fn effective_gas_price(&self) -> U256 {
        U256::ZERO
    }

    fn caller(&self) -> Address {
        Address::ZERO
    }

    fn blob_hash(&self, _number: usize) -> Option<U256> {
        None
    }

    fn max_initcode_size(&self) -> usize {
        MAX_INITCODE_SIZE
    }

    #[inline]
    fn block_hash(&mut self, number: u64) -> Option<B256> {
        Some(keccak256(number.to_be_bytes()))
    }

    #[inline]
    fn load_account(&mut self, _address: Address) -> Option<AccountLoad> {
        Some(AccountLoad {
            is_cold: false,
            is_empty: true,
        })
    }

    #[inline]
    fn balance(&mut self, _address: Address) -> Option<StateLoad<U256>> {
        Some(StateLoad::new(U256::ZERO, false))
    }

    #[inline]
    fn code(&mut self, _address: Address) -> Option<StateLoad<Bytes>> {
        Some(StateLoad::new(Bytes::new(), false))
    }

    #[inline]
    fn code_hash(&mut self, _address: Address) -> Option<StateLoad<B256>> {
        Some(StateLoad::new(B256::ZERO, false))
    }

    #[inline]
    fn sload(&mut self, _address: Address, index: U256) -> Option<StateLoad<U256>> {
        match self.storage.entry(index) {
            Entry::Occupied(entry) => Some(StateLoad::new(*entry.get(), false)),
            Entry::Vacant(entry) => {
                entry.insert(U256::ZERO);
                Some(StateLoad::new(U256::ZERO, true))
            }
        }
    }

    #[inline]
    fn sstore(
        &mut self,
        _address: Address,
        index: U256,
        value: U256,
    ) -> Option<StateLoad<SStoreResult>> {
        let present = self.storage.insert(index, value);
        Some(StateLoad::new(
            SStoreResult {
                original_value: U256::ZERO,
                present_value: present.unwrap_or_default(),
                new_value: value,
            },
            present.is_none(),
        ))
    }

    #[inline]
    fn tload(&mut self, _address: Address, index: U256) -> U256 {
        self.transient_storage
            .get(&index)
            .copied()
            .unwrap_or_default()
    }

    #[inline]
    fn tstore(&mut self, _address: Address, index: U256, value: U256) {
        self.transient_storage.insert(index, value);
    }

    #[inline]
    fn log(&mut self, log: Log) {
        self.log.push(log)
    }

    #[inline]
    fn selfdestruct(
        &mut self,
        _address: Address,
        _target: Address,
    ) -> Option<StateLoad<SelfDestructResult>> {
        Some(StateLoad::default())
    }
}
