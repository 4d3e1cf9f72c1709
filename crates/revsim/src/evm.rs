//! The [`Evm`] facade: one owned state, driven call by call.
use crate::{
    backend::{Backend, EvmDb},
    CallError, EvmOpts,
};
use bytecode::Bytecode;
use context::{
    BlockEnv, CfgEnv, Context, EVMError, Env, ExecutionResult, JournalCheckpoint, Output,
    ResultAndState, TxEnv,
};
use core::{fmt, mem};
use database::{CacheDB, Database, DatabaseCommit};
use handler::MainnetEvm;
use inspector::{
    inspectors::{NoOpInspector, TracerEip3155},
    Inspector,
};
use precompile::Precompiles;
use primitives::{Address, Bytes, TxKind, KECCAK_EMPTY, U256};
use state::{AccountInfo, EvmState};
use tracing::debug;

type EvmInspector = Box<dyn Inspector<EvmDb> + Send>;

/// EVM simulator over an in-memory account store, optionally forked from a remote node.
///
/// Outside of a snapshot every operation settles its changes into the store before returning.
/// Inside a snapshot changes stay in the journal until the snapshot is committed or reverted.
pub struct Evm {
    evm: MainnetEvm<EvmDb, EvmInspector>,
    gas_limit: u64,
    strict: bool,
    result: Option<ExecutionResult>,
}

impl fmt::Debug for Evm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evm")
            .field("env", &self.evm.ctx.env)
            .field("backend", &self.evm.ctx.db.db)
            .field("gas_limit", &self.gas_limit)
            .field("strict", &self.strict)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl Default for Evm {
    fn default() -> Self {
        Self::with_backend(Backend::empty(), Env::default(), &EvmOpts::default())
    }
}

impl Evm {
    /// Creates a simulator. Connects to the fork, if any, and pins its block.
    pub fn new(opts: EvmOpts) -> Result<Self, CallError> {
        let (backend, env) = match opts.fork_url.as_deref() {
            #[cfg(feature = "fork")]
            Some(url) => {
                let db = fork::connect(url, opts.fork_block.as_deref())?;
                let env = match opts.env.clone() {
                    Some(env) => env,
                    None => fork::pinned_env(&db.fetch_block_env()?),
                };
                (Backend::Fork(Box::new(db)), env)
            }
            #[cfg(not(feature = "fork"))]
            Some(_) => {
                return Err(CallError::InvalidOption(
                    "fork_url requires the `fork` feature".into(),
                ))
            }
            None if opts.fork_block.is_some() => {
                return Err(CallError::InvalidOption(
                    "fork_block is set without fork_url".into(),
                ))
            }
            None => (Backend::empty(), opts.env.clone().unwrap_or_default()),
        };
        Ok(Self::with_backend(backend, env, &opts))
    }

    fn with_backend(backend: Backend, env: Env, opts: &EvmOpts) -> Self {
        debug!(
            target: "revsim::evm",
            fork = backend.is_fork(),
            tracing = opts.tracing,
            strict = opts.strict,
            spec = %env.cfg.spec,
            "created evm"
        );
        let inspector: EvmInspector = if opts.tracing {
            Box::new(TracerEip3155::new_stdout())
        } else {
            Box::new(NoOpInspector)
        };
        let ctx = Context::new(CacheDB::new(backend), env);
        Self {
            evm: MainnetEvm::new(ctx, inspector),
            gas_limit: opts.gas_limit,
            strict: opts.strict,
            result: None,
        }
    }

    /// Replaces the inspector driven by every transaction.
    pub fn set_inspector(&mut self, inspector: impl Inspector<EvmDb> + Send + 'static) {
        self.evm.inspector = Box::new(inspector);
    }

    /// Current environment.
    pub fn env(&self) -> &Env {
        &self.evm.ctx.env
    }

    /// Replaces the block environment.
    pub fn set_block_env(&mut self, block: BlockEnv) {
        self.evm.ctx.env.block = block;
    }

    /// Replaces the transaction environment used by [`Self::transact`].
    pub fn set_tx_env(&mut self, tx: TxEnv) {
        self.evm.ctx.env.tx = tx;
    }

    /// Replaces the configuration, including the hardfork.
    pub fn set_cfg_env(&mut self, cfg: CfgEnv) {
        self.evm.precompiles = Precompiles::new(cfg.spec);
        self.evm.ctx.env.cfg = cfg;
    }

    /// Result of the last executed transaction.
    pub fn result(&self) -> Option<&ExecutionResult> {
        self.result.as_ref()
    }

    /// Account store. Holds the changes settled so far.
    pub fn db(&self) -> &EvmDb {
        &self.evm.ctx.db
    }

    /// Deploys `code` from `deployer` and commits the result.
    ///
    /// A failed deployment is an error whether or not the simulator is strict.
    pub fn deploy(
        &mut self,
        deployer: Address,
        code: Bytes,
        value: U256,
    ) -> Result<Address, CallError> {
        let tx = self.facade_tx(deployer, TxKind::Create, code, value, None);
        let ResultAndState { result, .. } = self.run_tx(tx, true)?;
        if let Some(err) = failure(&result) {
            return Err(err);
        }
        match result {
            ExecutionResult::Success {
                output: Output::Create(_, Some(address)),
                ..
            } => Ok(address),
            _ => Err(CallError::Evm(EVMError::Custom(
                "deployment returned no address".into(),
            ))),
        }
    }

    /// Calls `to` without keeping any of its changes.
    ///
    /// `gas` defaults to the gas limit the simulator was created with.
    pub fn message_call(
        &mut self,
        caller: Address,
        to: Address,
        calldata: Bytes,
        value: U256,
        gas: Option<u64>,
    ) -> Result<Bytes, CallError> {
        let tx = self.facade_tx(caller, TxKind::Call(to), calldata, value, gas);
        let ResultAndState { result, .. } = self.run_tx(tx, false)?;
        Ok(result.into_output().unwrap_or_default())
    }

    /// Calls `to` without keeping its changes, returning them next to the output.
    pub fn call_raw(
        &mut self,
        caller: Address,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<(Bytes, EvmState), CallError> {
        let tx = self.facade_tx(caller, TxKind::Call(to), data, value, None);
        let ResultAndState { result, state } = self.run_tx(tx, false)?;
        Ok((result.into_output().unwrap_or_default(), state))
    }

    /// Calls `to` and keeps its changes.
    pub fn call_raw_committing(
        &mut self,
        caller: Address,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> Result<Bytes, CallError> {
        let tx = self.facade_tx(caller, TxKind::Call(to), data, value, None);
        let ResultAndState { result, .. } = self.run_tx(tx, true)?;
        Ok(result.into_output().unwrap_or_default())
    }

    /// Executes the transaction environment as is.
    pub fn transact(&mut self, commit: bool) -> Result<ExecutionResult, CallError> {
        self.execute(commit).map(|outcome| outcome.result)
    }

    /// Opens a snapshot. Until it is closed, changes stay revertible.
    pub fn snapshot(&mut self) -> JournalCheckpoint {
        self.evm.ctx.journaled_state.checkpoint()
    }

    /// Undoes every change since `checkpoint` and closes it with the snapshots opened after it.
    pub fn revert(&mut self, checkpoint: JournalCheckpoint) -> Result<(), CallError> {
        self.evm
            .ctx
            .journaled_state
            .checkpoint_revert(checkpoint)?;
        self.settle();
        Ok(())
    }

    /// Keeps every change since `checkpoint` and closes it with the snapshots opened after it.
    pub fn commit(&mut self, checkpoint: JournalCheckpoint) -> Result<(), CallError> {
        self.evm
            .ctx
            .journaled_state
            .checkpoint_commit(checkpoint)?;
        self.settle();
        Ok(())
    }

    /// Account info. Unknown accounts read as empty.
    pub fn basic(&mut self, address: Address) -> Result<AccountInfo, CallError> {
        let ctx = &mut self.evm.ctx;
        if let Some(account) = ctx.journaled_state.account(address) {
            return Ok(account.info.clone());
        }
        Ok(ctx.db.basic(address)?.unwrap_or_default())
    }

    /// Account balance.
    pub fn get_balance(&mut self, address: Address) -> Result<U256, CallError> {
        self.basic(address).map(|info| info.balance)
    }

    /// Account nonce.
    pub fn get_nonce(&mut self, address: Address) -> Result<u64, CallError> {
        self.basic(address).map(|info| info.nonce)
    }

    /// Account code, empty for accounts without code.
    pub fn get_code(&mut self, address: Address) -> Result<Bytes, CallError> {
        let info = self.basic(address)?;
        let code = match info.code {
            Some(code) => code,
            None if info.code_hash == KECCAK_EMPTY => return Ok(Bytes::new()),
            None => self.evm.ctx.db.code_by_hash(info.code_hash)?,
        };
        Ok(code.original_bytes())
    }

    /// Storage slot. Absent slots read as zero.
    pub fn storage(&mut self, address: Address, index: U256) -> Result<U256, CallError> {
        let ctx = &mut self.evm.ctx;
        if let Some(account) = ctx.journaled_state.account(address) {
            if let Some(slot) = account.storage.get(&index) {
                return Ok(slot.present_value());
            }
            if account.is_created() {
                return Ok(U256::ZERO);
            }
        }
        Ok(ctx.db.storage(address, index)?)
    }

    /// Overwrites the account balance.
    pub fn set_balance(&mut self, address: Address, balance: U256) -> Result<(), CallError> {
        let ctx = &mut self.evm.ctx;
        ctx.journaled_state
            .set_balance(address, balance, &mut ctx.db)?;
        self.settle();
        Ok(())
    }

    /// Overwrites the account nonce.
    pub fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<(), CallError> {
        let ctx = &mut self.evm.ctx;
        ctx.journaled_state.set_nonce(address, nonce, &mut ctx.db)?;
        self.settle();
        Ok(())
    }

    /// Overwrites the account code.
    pub fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), CallError> {
        let ctx = &mut self.evm.ctx;
        ctx.journaled_state
            .set_code(address, Bytecode::new_raw(code), &mut ctx.db)?;
        self.settle();
        Ok(())
    }

    /// Overwrites a storage slot.
    pub fn set_storage(
        &mut self,
        address: Address,
        index: U256,
        value: U256,
    ) -> Result<(), CallError> {
        let ctx = &mut self.evm.ctx;
        ctx.journaled_state
            .sstore(address, index, value, &mut ctx.db)?;
        ctx.journaled_state.touch(address);
        self.settle();
        Ok(())
    }

    /// Overwrites balance, nonce and code of an account. Storage is kept.
    pub fn insert_account_info(
        &mut self,
        address: Address,
        info: AccountInfo,
    ) -> Result<(), CallError> {
        let ctx = &mut self.evm.ctx;
        if !ctx.journaled_state.has_open_checkpoints() {
            ctx.db.insert_account_info(address, info);
            return Ok(());
        }
        let code = match info.code {
            Some(code) => code,
            None if info.code_hash == KECCAK_EMPTY => Bytecode::default(),
            None => ctx.db.code_by_hash(info.code_hash)?,
        };
        let journal = &mut ctx.journaled_state;
        journal.set_balance(address, info.balance, &mut ctx.db)?;
        journal.set_nonce(address, info.nonce, &mut ctx.db)?;
        journal.set_code(address, code, &mut ctx.db)?;
        Ok(())
    }

    /// Transaction for a facade call. Fee fields and chain id follow the current environment.
    fn facade_tx(
        &self,
        caller: Address,
        transact_to: TxKind,
        data: Bytes,
        value: U256,
        gas: Option<u64>,
    ) -> TxEnv {
        let current = &self.evm.ctx.env.tx;
        TxEnv {
            caller,
            gas_limit: gas.unwrap_or(self.gas_limit),
            gas_price: current.gas_price,
            gas_priority_fee: current.gas_priority_fee,
            transact_to,
            value,
            data,
            chain_id: current.chain_id,
            ..Default::default()
        }
    }

    /// Runs `tx` in place of the transaction environment, which is restored afterwards.
    fn run_tx(&mut self, tx: TxEnv, commit: bool) -> Result<ResultAndState, CallError> {
        let previous = mem::replace(&mut self.evm.ctx.env.tx, tx);
        let outcome = self.execute(commit);
        self.evm.ctx.env.tx = previous;
        outcome
    }

    fn execute(&mut self, commit: bool) -> Result<ResultAndState, CallError> {
        self.result = None;
        let outcome = if commit {
            self.evm.transact_commit()
        } else {
            self.evm.transact()
        };
        self.settle();
        let outcome = outcome?;
        self.result = Some(outcome.result.clone());
        if self.strict {
            if let Some(err) = failure(&outcome.result) {
                return Err(err);
            }
        }
        Ok(outcome)
    }

    /// Moves the journal into the store once no snapshot is open.
    fn settle(&mut self) {
        let ctx = &mut self.evm.ctx;
        if let Some((state, _)) = ctx.journaled_state.finalize() {
            ctx.db.commit(state);
        }
    }
}

fn failure(result: &ExecutionResult) -> Option<CallError> {
    match result {
        ExecutionResult::Success { .. } => None,
        ExecutionResult::Revert { output, gas_used } => Some(CallError::Reverted {
            output: output.clone(),
            gas_used: *gas_used,
        }),
        ExecutionResult::Halt { reason, gas_used } => Some(CallError::Halted {
            reason: *reason,
            gas_used: *gas_used,
        }),
    }
}

#[cfg(feature = "fork")]
mod fork {
    use crate::CallError;
    use alloy_provider::{network::Ethereum, DynProvider, Provider, ProviderBuilder};
    use context::Env;
    use database::{AlloyDB, BlockId, ForkBlock};

    /// Connects to `url` over HTTP and pins `block`, `latest` when unset.
    pub(super) fn connect(
        url: &str,
        block: Option<&str>,
    ) -> Result<AlloyDB<Ethereum, DynProvider>, CallError> {
        let rpc_url = url
            .parse()
            .map_err(|err| CallError::InvalidOption(format!("fork_url {url:?}: {err}")))?;
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
        let block_id = parse_block_id(block.unwrap_or("latest"))?;
        Ok(AlloyDB::pinned(provider, block_id)?)
    }

    /// Decimal numbers are block numbers; anything else is parsed as a tag or a hex id.
    pub(super) fn parse_block_id(block: &str) -> Result<BlockId, CallError> {
        if let Ok(number) = block.parse::<u64>() {
            return Ok(BlockId::number(number));
        }
        block
            .parse()
            .map_err(|err| CallError::InvalidOption(format!("fork_block {block:?}: {err}")))
    }

    /// Environment of the pinned block.
    ///
    /// Facade calls default to a zero gas price and an unbounded gas limit, so the block gas
    /// limit and the base fee are reported to contracts but not enforced.
    pub(super) fn pinned_env(block: &ForkBlock) -> Env {
        let mut env = Env::default();
        env.cfg.chain_id = block.chain_id;
        env.cfg.disable_block_gas_limit = true;
        env.cfg.disable_base_fee = true;
        env.block.number = block.number;
        env.block.coinbase = block.coinbase;
        env.block.timestamp = block.timestamp;
        env.block.gas_limit = block.gas_limit;
        env.block.basefee = block.basefee;
        env.block.difficulty = block.difficulty;
        env.block.prevrandao = Some(block.prevrandao);
        // blocks before Cancun run with an idle blob market
        env.block
            .set_blob_excess_gas_and_price(block.excess_blob_gas.unwrap_or_default());
        env
    }

}
