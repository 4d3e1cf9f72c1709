//! Work done before the first frame: warming accounts and charging the caller.
use context::{Context, EVMError, InvalidTransaction};
use database_interface::Database;
use precompile::Precompiles;
use primitives::{hardfork::SpecId, HashSet, TxKind, U256};

/// Starts the transaction in the journal and warms the preloaded addresses and the access list.
pub fn load_accounts<DB: Database>(
    ctx: &mut Context<DB>,
    precompiles: &Precompiles,
) -> Result<(), EVMError<DB::Error>> {
    let spec = ctx.spec_id();
    let mut warm: HashSet<_> = precompiles.addresses().copied().collect();
    warm.insert(ctx.env.tx.caller);
    if let TxKind::Call(target) = ctx.env.tx.transact_to {
        warm.insert(target);
    }
    // EIP-3651: Warm COINBASE
    if spec.is_enabled_in(SpecId::SHANGHAI) {
        warm.insert(ctx.env.block.coinbase);
    }
    ctx.journaled_state.begin_tx(spec, warm);

    let Context {
        env,
        journaled_state,
        db,
        ..
    } = ctx;
    // EIP-2930: Optional access lists
    if spec.is_enabled_in(SpecId::BERLIN) {
        journaled_state.warm_access_list(
            env.tx
                .access_list
                .iter()
                .map(|item| (item.address, item.storage_keys.clone())),
            db,
        )?;
    }
    Ok(())
}

/// Checks the transaction against the caller's account: code, nonce and balance.
pub fn validate_tx_against_state<DB: Database>(
    ctx: &mut Context<DB>,
) -> Result<(), EVMError<DB::Error>> {
    let caller = ctx.env.tx.caller;
    let account = ctx.journaled_state.load_account(caller, &mut ctx.db)?;
    ctx.env.validate_tx_against_state(&account.data.info)?;
    Ok(())
}

/// Deducts the maximum gas cost and the blob fee from the caller and bumps its nonce.
///
/// The nonce of a create transaction is bumped by its create frame.
pub fn deduct_caller<DB: Database>(ctx: &mut Context<DB>) -> Result<(), EVMError<DB::Error>> {
    let caller = ctx.env.tx.caller;
    let mut gas_cost =
        U256::from(ctx.env.tx.gas_limit).saturating_mul(ctx.env.effective_gas_price());
    // EIP-4844
    if let Some(data_fee) = ctx.env.calc_data_fee() {
        gas_cost = gas_cost.saturating_add(data_fee);
    }

    let balance = ctx
        .journaled_state
        .load_account(caller, &mut ctx.db)?
        .data
        .info
        .balance;
    // Set new caller balance. The balance check can be disabled, so saturate.
    ctx.journaled_state
        .set_balance(caller, balance.saturating_sub(gas_cost), &mut ctx.db)?;

    if !ctx.env.tx.is_create() && ctx.journaled_state.inc_nonce(caller).is_none() {
        return Err(InvalidTransaction::NonceOverflowInTransaction.into());
    }
    Ok(())
}
