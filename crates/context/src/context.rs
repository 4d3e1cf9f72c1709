//! [`Context`] ties the environment, the journal and the database together and serves them to
//! the interpreter through [`Host`].
use crate::{Env, JournaledState};
use database_interface::Database;
use interpreter::{AccountLoad, Host, SStoreResult, SelfDestructResult, StateLoad};
use primitives::{hardfork::SpecId, Address, Bytes, HashSet, Log, B256, KECCAK_EMPTY, U256};

/// EVM context: everything a transaction reads and writes.
#[derive(Debug)]
pub struct Context<DB: Database> {
    /// Environment of the current transaction.
    pub env: Env,
    /// EVM State with journaling support.
    pub journaled_state: JournaledState,
    /// Database to load data from.
    pub db: DB,
    /// Error that happened during execution.
    ///
    /// [`Host`] methods cannot return database errors, so they park them here.
    pub error: Result<(), DB::Error>,
}

impl<DB: Database + Default> Default for Context<DB> {
    fn default() -> Self {
        Self::new(DB::default(), Env::default())
    }
}

impl<DB: Database> Context<DB> {
    /// Creates a new context over `db`.
    pub fn new(db: DB, env: Env) -> Self {
        let journaled_state = JournaledState::new(env.cfg.spec, HashSet::default());
        Self {
            env,
            journaled_state,
            db,
            error: Ok(()),
        }
    }

    /// Active hardfork.
    #[inline]
    pub fn spec_id(&self) -> SpecId {
        self.env.cfg.spec
    }

    /// Returns the stored database error, leaving `Ok(())` in its place.
    pub fn take_error(&mut self) -> Result<(), DB::Error> {
        core::mem::replace(&mut self.error, Ok(()))
    }

    /// Records a database error and turns the result into an `Option` for [`Host`].
    #[inline]
    fn or_store_error<T>(error: &mut Result<(), DB::Error>, res: Result<T, DB::Error>) -> Option<T> {
        res.map_err(|e| *error = Err(e)).ok()
    }

    /// Whether a loaded account counts as empty for gas purposes.
    ///
    /// Before EIP-161 an account was empty only if it did not exist.
    #[inline]
    fn is_empty_for_spec(spec: SpecId, account: &state::Account) -> bool {
        if spec.is_enabled_in(SpecId::SPURIOUS_DRAGON) {
            account.is_empty()
        } else {
            account.is_loaded_as_not_existing() && !account.is_touched()
        }
    }
}

impl<DB: Database> Host for Context<DB> {
    /* Block */

    fn basefee(&self) -> U256 {
        U256::from(self.env.block.basefee)
    }

    fn blob_gasprice(&self) -> U256 {
        U256::from(self.env.block.blob_gasprice().unwrap_or(0))
    }

    fn gas_limit(&self) -> U256 {
        U256::from(self.env.block.gas_limit)
    }

    fn difficulty(&self) -> U256 {
        self.env.block.difficulty
    }

    fn prevrandao(&self) -> Option<B256> {
        self.env.block.prevrandao
    }

    fn block_number(&self) -> u64 {
        self.env.block.number
    }

    fn timestamp(&self) -> U256 {
        U256::from(self.env.block.timestamp)
    }

    fn beneficiary(&self) -> Address {
        self.env.block.coinbase
    }

    fn chain_id(&self) -> U256 {
        U256::from(self.env.cfg.chain_id)
    }

    /* Transaction */

    fn effective_gas_price(&self) -> U256 {
        self.env.effective_gas_price()
    }

    fn caller(&self) -> Address {
        self.env.tx.caller
    }

    fn blob_hash(&self, number: usize) -> Option<U256> {
        self.env
            .tx
            .blob_hashes
            .get(number)
            .map(|hash| U256::from_be_bytes(hash.0))
    }

    /* Config */

    fn max_initcode_size(&self) -> usize {
        self.env.cfg.max_initcode_size()
    }

    /* Database */

    fn block_hash(&mut self, number: u64) -> Option<B256> {
        let res = self.db.block_hash(number);
        Self::or_store_error(&mut self.error, res)
    }

    /* Journal */

    fn load_account(&mut self, address: Address) -> Option<AccountLoad> {
        let spec = self.spec_id();
        let res = self
            .journaled_state
            .load_account(address, &mut self.db)
            .map(|load| AccountLoad {
                is_cold: load.is_cold,
                is_empty: Self::is_empty_for_spec(spec, load.data),
            });
        Self::or_store_error(&mut self.error, res)
    }

    fn balance(&mut self, address: Address) -> Option<StateLoad<U256>> {
        let res = self
            .journaled_state
            .load_account(address, &mut self.db)
            .map(|load| load.map(|account| account.info.balance));
        Self::or_store_error(&mut self.error, res)
    }

    fn code(&mut self, address: Address) -> Option<StateLoad<Bytes>> {
        let res = self
            .journaled_state
            .load_code(address, &mut self.db)
            .map(|load| {
                load.map(|account| {
                    account
                        .info
                        .code
                        .as_ref()
                        .map(|code| code.original_bytes())
                        .unwrap_or_default()
                })
            });
        Self::or_store_error(&mut self.error, res)
    }

    fn code_hash(&mut self, address: Address) -> Option<StateLoad<B256>> {
        let spec = self.spec_id();
        let res = self
            .journaled_state
            .load_account(address, &mut self.db)
            .map(|load| {
                load.map(|account| {
                    if Self::is_empty_for_spec(spec, account) {
                        B256::ZERO
                    } else if account.info.code_hash.is_zero() {
                        KECCAK_EMPTY
                    } else {
                        account.info.code_hash
                    }
                })
            });
        Self::or_store_error(&mut self.error, res)
    }

    fn sload(&mut self, address: Address, index: U256) -> Option<StateLoad<U256>> {
        let res = self.journaled_state.sload(address, index, &mut self.db);
        Self::or_store_error(&mut self.error, res)
    }

    fn sstore(
        &mut self,
        address: Address,
        index: U256,
        value: U256,
    ) -> Option<StateLoad<SStoreResult>> {
        let res = self
            .journaled_state
            .sstore(address, index, value, &mut self.db);
        Self::or_store_error(&mut self.error, res)
    }

    fn tload(&mut self, address: Address, index: U256) -> U256 {
        self.journaled_state.tload(address, index)
    }

    fn tstore(&mut self, address: Address, index: U256, value: U256) {
        self.journaled_state.tstore(address, index, value)
    }

    fn log(&mut self, log: Log) {
        self.journaled_state.log(log);
    }

    fn selfdestruct(
        &mut self,
        address: Address,
        target: Address,
    ) -> Option<StateLoad<SelfDestructResult>> {
        let res = self
            .journaled_state
            .selfdestruct(address, target, &mut self.db);
        Self::or_store_error(&mut self.error, res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{CacheDB, InMemoryDB};
    use database_interface::{DBErrorMarker, DatabaseRef};
    use state::{AccountInfo, Bytecode};

    #[test]
    fn code_hash_of_empty_account_is_zero() {
        let mut ctx = Context::<InMemoryDB>::default();
        let contract = Address::with_last_byte(1);
        let code = Bytecode::new_raw(Bytes::from_static(&[0x00]));
        ctx.db
            .insert_account_info(contract, AccountInfo::from_bytecode(code.clone()));

        let empty = ctx.code_hash(Address::with_last_byte(2)).unwrap();
        assert_eq!(empty, StateLoad::new(B256::ZERO, true));

        let hash = ctx.code_hash(contract).unwrap();
        assert_eq!(hash.data, code.hash_slow());
        assert_eq!(ctx.code(contract).unwrap().data, code.original_bytes());
    }

    #[test]
    fn blob_hash_and_env_getters() {
        let mut ctx = Context::<InMemoryDB>::default();
        ctx.env.tx.blob_hashes = vec![B256::with_last_byte(9)];
        ctx.env.block.number = 42;
        assert_eq!(ctx.blob_hash(0), Some(U256::from(9)));
        assert_eq!(ctx.blob_hash(1), None);
        assert_eq!(ctx.block_number(), 42);
        assert_eq!(ctx.blob_gasprice(), U256::from(1));
        assert_eq!(ctx.chain_id(), U256::from(1));
    }

    #[derive(Debug, Default)]
    struct FailingDb;

    #[derive(Debug)]
    struct Unreachable;

    impl core::fmt::Display for Unreachable {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str("unreachable")
        }
    }

    impl core::error::Error for Unreachable {}
    impl DBErrorMarker for Unreachable {}

    impl DatabaseRef for FailingDb {
        type Error = Unreachable;

        fn basic_ref(&self, _address: Address) -> Result<Option<AccountInfo>, Self::Error> {
            Err(Unreachable)
        }

        fn code_by_hash_ref(&self, _code_hash: B256) -> Result<Bytecode, Self::Error> {
            Err(Unreachable)
        }

        fn storage_ref(&self, _address: Address, _index: U256) -> Result<U256, Self::Error> {
            Err(Unreachable)
        }

        fn block_hash_ref(&self, _number: u64) -> Result<B256, Self::Error> {
            Err(Unreachable)
        }
    }

    #[test]
    fn database_errors_are_parked() {
        let mut ctx = Context::<CacheDB<FailingDb>>::default();
        assert!(ctx.balance(Address::with_last_byte(1)).is_none());
        assert!(ctx.error.is_err());
        assert!(ctx.take_error().is_err());
        assert!(ctx.error.is_ok());
    }
}
