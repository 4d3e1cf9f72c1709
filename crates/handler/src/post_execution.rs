//! Gas settlement and result assembly after the first frame returned.
use crate::FrameResult;
use context::{Context, EVMError, ExecutionResult};
use database_interface::Database;
use interpreter::{Gas, InstructionResult, SuccessOrHalt};
use primitives::{hardfork::SpecId, Log, U256};
use std::{format, vec::Vec};

/// Rebuilds the gas of the first frame against the transaction gas limit.
///
/// The intrinsic gas stays spent, unspent gas and refunds are only returned when the frame
/// succeeded or reverted.
pub fn last_frame_return<DB: Database>(ctx: &Context<DB>, frame_result: &mut FrameResult) {
    let instruction_result = frame_result.instruction_result();
    let gas = frame_result.gas_mut();
    let remaining = gas.remaining();
    let refunded = gas.refunded();

    // Spend the gas limit. Gas is reimbursed when the tx returns successfully.
    *gas = Gas::new_spent(ctx.env.tx.gas_limit);

    if instruction_result.is_ok() || instruction_result.is_revert() {
        gas.erase_cost(remaining);
    }
    if instruction_result.is_ok() {
        gas.record_refund(refunded);
    }
}

/// Caps the refund, 1/5 of the gas spent from London and 1/2 before.
pub fn refund<DB: Database>(ctx: &Context<DB>, frame_result: &mut FrameResult) {
    frame_result
        .gas_mut()
        .set_final_refund(ctx.spec_id().is_enabled_in(SpecId::LONDON));
}

/// Returns the unspent and refunded gas to the caller.
pub fn reimburse_caller<DB: Database>(
    ctx: &mut Context<DB>,
    gas: &Gas,
) -> Result<(), EVMError<DB::Error>> {
    let caller = ctx.env.tx.caller;
    let effective_gas_price = ctx.env.effective_gas_price();
    let reimbursed = effective_gas_price
        .saturating_mul(U256::from(gas.remaining() + gas.refunded() as u64));

    let balance = ctx
        .journaled_state
        .load_account(caller, &mut ctx.db)?
        .data
        .info
        .balance;
    ctx.journaled_state
        .set_balance(caller, balance.saturating_add(reimbursed), &mut ctx.db)?;
    Ok(())
}

/// Pays the priority fee for the used gas to the coinbase.
pub fn reward_beneficiary<DB: Database>(
    ctx: &mut Context<DB>,
    gas: &Gas,
) -> Result<(), EVMError<DB::Error>> {
    let beneficiary = ctx.env.block.coinbase;
    let effective_gas_price = ctx.env.effective_gas_price();

    // EIP-1559 discard basefee for coinbase transfer.
    let coinbase_gas_price = if ctx.spec_id().is_enabled_in(SpecId::LONDON) {
        effective_gas_price.saturating_sub(U256::from(ctx.env.block.basefee))
    } else {
        effective_gas_price
    };
    let reward =
        coinbase_gas_price.saturating_mul(U256::from(gas.spent() - gas.refunded() as u64));

    let balance = ctx
        .journaled_state
        .load_account(beneficiary, &mut ctx.db)?
        .data
        .info
        .balance;
    ctx.journaled_state
        .set_balance(beneficiary, balance.saturating_add(reward), &mut ctx.db)?;
    Ok(())
}

/// Builds the [`ExecutionResult`] of the transaction.
pub fn output<DBError>(
    frame_result: FrameResult,
    logs: Vec<Log>,
) -> Result<ExecutionResult, EVMError<DBError>> {
    let instruction_result = frame_result.instruction_result();
    let gas = *frame_result.gas();
    let gas_refunded = gas.refunded() as u64;
    let gas_used = gas.spent() - gas_refunded;
    let output = frame_result.output();

    Ok(match SuccessOrHalt::from(instruction_result) {
        SuccessOrHalt::Success(reason) => ExecutionResult::Success {
            reason,
            gas_used,
            gas_refunded,
            logs,
            output,
        },
        SuccessOrHalt::Revert => ExecutionResult::Revert {
            gas_used,
            output: output.into_data(),
        },
        SuccessOrHalt::Halt(reason) => ExecutionResult::Halt { reason, gas_used },
        // Only the interpreter loop sees these.
        flag @ (SuccessOrHalt::FatalExternalError
        | SuccessOrHalt::InternalContinue
        | SuccessOrHalt::InternalCallOrCreate) => {
            return Err(EVMError::Custom(format!(
                "encountered unexpected internal return flag: {flag:?} with instruction result: {instruction_result:?}"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use context::Output;
    use database::InMemoryDB;
    use interpreter::{CallOutcome, InterpreterResult};
    use primitives::Bytes;

    fn call_result(result: InstructionResult, gas: Gas) -> FrameResult {
        FrameResult::Call(CallOutcome::new(
            InterpreterResult::new(result, Bytes::new(), gas),
            0..0,
        ))
    }

    fn frame_gas(limit: u64, spent: u64, refund: i64) -> Gas {
        let mut gas = Gas::new(limit);
        assert!(gas.record_cost(spent));
        gas.record_refund(refund);
        gas
    }

    #[test]
    fn success_keeps_intrinsic_gas_and_refund() {
        let mut ctx = Context::<InMemoryDB>::default();
        ctx.env.tx.gas_limit = 100_000;
        // 21_000 intrinsic, the frame ran with the rest.
        let mut result = call_result(InstructionResult::Stop, frame_gas(79_000, 10_000, 4_000));
        last_frame_return(&ctx, &mut result);
        assert_eq!(result.gas().spent(), 31_000);
        assert_eq!(result.gas().refunded(), 4_000);

        refund(&ctx, &mut result);
        // capped at spent / 5
        assert_eq!(result.gas().refunded(), 4_000);

        let output = output::<()>(result, Vec::new()).unwrap();
        assert_eq!(output.gas_used(), 27_000);
        assert!(output.is_success());
    }

    #[test]
    fn revert_drops_refund() {
        let mut ctx = Context::<InMemoryDB>::default();
        ctx.env.tx.gas_limit = 50_000;
        let mut result = call_result(InstructionResult::Revert, frame_gas(29_000, 1_000, 500));
        last_frame_return(&ctx, &mut result);
        assert_eq!(result.gas().spent(), 22_000);
        assert_eq!(result.gas().refunded(), 0);
        assert!(matches!(
            output::<()>(result, Vec::new()),
            Ok(ExecutionResult::Revert { gas_used: 22_000, .. })
        ));
    }

    #[test]
    fn halt_spends_everything() {
        let mut ctx = Context::<InMemoryDB>::default();
        ctx.env.tx.gas_limit = 50_000;
        let mut result = call_result(InstructionResult::InvalidJump, frame_gas(29_000, 8, 0));
        last_frame_return(&ctx, &mut result);
        assert_eq!(result.gas().spent(), 50_000);
        assert!(output::<()>(result, Vec::new()).unwrap().is_halt());
    }

    #[test]
    fn internal_flags_are_errors() {
        let result = call_result(InstructionResult::CallOrCreate, Gas::new(0));
        assert!(matches!(
            output::<()>(result, Vec::new()),
            Err(EVMError::Custom(_))
        ));
    }

    #[test]
    fn create_output_carries_address() {
        let outcome = interpreter::CreateOutcome::new(
            InterpreterResult::new(InstructionResult::Return, Bytes::new(), Gas::new(0)),
            Some(primitives::Address::with_last_byte(1)),
        );
        assert_eq!(
            FrameResult::Create(outcome).output(),
            Output::Create(Bytes::new(), Some(primitives::Address::with_last_byte(1)))
        );
    }
}
