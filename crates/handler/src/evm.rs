//! The mainnet EVM: runs a transaction from validation to the final [`ResultAndState`].
use crate::{
    frame::{Frame, FrameInput, FrameResult, ItemOrResult},
    post_execution, pre_execution, validation,
};
use context::{Context, EVMError, JournalCheckpoint, ResultAndState};
use database_interface::Database;
use inspector::{inspectors::NoOpInspector, Inspector};
use interpreter::{
    bytecode::opcode, instructions::utility::IntoAddress, make_instruction_table, CallInputs,
    CallScheme, CallValue, CreateInputs, CreateScheme, InstructionResult, InstructionTable,
    Interpreter, InterpreterAction,
};
use precompile::Precompiles;
use primitives::TxKind;
use std::{boxed::Box, string::ToString, vec, vec::Vec};
use tracing::debug;

/// Mainnet EVM over a [`Context`], with an [`Inspector`] hooked into every step.
pub struct MainnetEvm<DB: Database, INSP = NoOpInspector> {
    /// Environment, journal and database.
    pub ctx: Context<DB>,
    /// Inspector called from the frame loop.
    pub inspector: INSP,
    /// Precompiles available to calls.
    pub precompiles: Precompiles,
    instruction_table: InstructionTable<Context<DB>>,
}

impl<DB, INSP> core::fmt::Debug for MainnetEvm<DB, INSP>
where
    DB: Database + core::fmt::Debug,
    DB::Error: core::fmt::Debug,
    INSP: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MainnetEvm")
            .field("ctx", &self.ctx)
            .field("inspector", &self.inspector)
            .field("precompiles", &self.precompiles)
            .finish_non_exhaustive()
    }
}

impl<DB: Database, INSP: Inspector<DB>> MainnetEvm<DB, INSP> {
    /// Creates a new EVM.
    pub fn new(ctx: Context<DB>, inspector: INSP) -> Self {
        let precompiles = Precompiles::new(ctx.spec_id());
        Self {
            ctx,
            inspector,
            precompiles,
            instruction_table: make_instruction_table::<Context<DB>>(),
        }
    }

    /// Swaps the inspector.
    pub fn with_inspector<OINSP: Inspector<DB>>(self, inspector: OINSP) -> MainnetEvm<DB, OINSP> {
        MainnetEvm {
            ctx: self.ctx,
            inspector,
            precompiles: self.precompiles,
            instruction_table: self.instruction_table,
        }
    }

    /// Consumes the EVM and returns its context.
    pub fn into_context(self) -> Context<DB> {
        self.ctx
    }

    /// Executes the transaction in the environment and reverts every change it made.
    ///
    /// The returned state holds the accounts the transaction touched, as they were right
    /// before the revert.
    pub fn transact(&mut self) -> Result<ResultAndState, EVMError<DB::Error>> {
        self.transact_inner(false)
    }

    /// Executes the transaction and keeps its changes in the journal.
    pub fn transact_commit(&mut self) -> Result<ResultAndState, EVMError<DB::Error>> {
        self.transact_inner(true)
    }

    fn transact_inner(&mut self, commit: bool) -> Result<ResultAndState, EVMError<DB::Error>> {
        validation::validate_env(&self.ctx.env)?;
        let initial_gas = validation::validate_initial_tx_gas(&self.ctx.env)?;
        pre_execution::load_accounts(&mut self.ctx, &self.precompiles)?;
        pre_execution::validate_tx_against_state(&mut self.ctx)?;

        let checkpoint = self.ctx.journaled_state.checkpoint();
        let output = self.execute(initial_gas, checkpoint);

        let journal = &mut self.ctx.journaled_state;
        let closed = match output {
            Ok(_) if commit => journal.checkpoint_commit(checkpoint),
            _ => journal.checkpoint_revert(checkpoint),
        };
        if output.is_err() {
            journal.transient_storage.clear();
            // drop a database error the failing step left behind
            let _ = self.ctx.take_error();
        }
        closed?;

        if let Ok(ResultAndState { result, .. }) = &output {
            self.inspector.transaction_end(&mut self.ctx, result);
            debug!(
                target: "revsim::evm",
                success = result.is_success(),
                gas_used = result.gas_used(),
                commit,
                "transaction executed"
            );
        }
        output
    }

    fn execute(
        &mut self,
        initial_gas: u64,
        checkpoint: JournalCheckpoint,
    ) -> Result<ResultAndState, EVMError<DB::Error>> {
        pre_execution::deduct_caller(&mut self.ctx)?;

        let first_frame = self.first_frame_input(initial_gas);
        let mut frame_result = self.run_exec_loop(first_frame)?;

        post_execution::last_frame_return(&self.ctx, &mut frame_result);
        post_execution::refund(&self.ctx, &mut frame_result);
        let gas = *frame_result.gas();
        post_execution::reimburse_caller(&mut self.ctx, &gas)?;
        post_execution::reward_beneficiary(&mut self.ctx, &gas)?;

        self.ctx.journaled_state.end_tx();
        let journal = &self.ctx.journaled_state;
        let logs = journal
            .logs_since(checkpoint)?
            .to_vec();
        let state = journal.changes_since(checkpoint)?;

        let result = post_execution::output(frame_result, logs)?;
        Ok(ResultAndState { result, state })
    }

    /// Builds the inputs of the first frame from the transaction.
    fn first_frame_input(&self, initial_gas: u64) -> FrameInput {
        let tx = &self.ctx.env.tx;
        let gas_limit = tx.gas_limit - initial_gas;
        match tx.transact_to {
            TxKind::Call(target_address) => FrameInput::Call(Box::new(CallInputs {
                input: tx.data.clone(),
                return_memory_offset: 0..0,
                gas_limit,
                bytecode_address: target_address,
                target_address,
                caller: tx.caller,
                value: CallValue::Transfer(tx.value),
                scheme: CallScheme::Call,
                is_static: false,
            })),
            TxKind::Create => FrameInput::Create(Box::new(CreateInputs {
                caller: tx.caller,
                scheme: CreateScheme::Create,
                value: tx.value,
                init_code: tx.data.clone(),
                gas_limit,
            })),
        }
    }

    fn run_exec_loop(
        &mut self,
        first_frame: FrameInput,
    ) -> Result<FrameResult, EVMError<DB::Error>> {
        let frame = match self.frame_init(first_frame, 0)? {
            ItemOrResult::Item(frame) => frame,
            ItemOrResult::Result(result) => return Ok(result),
        };
        let mut frame_stack: Vec<Frame> = vec![frame];
        loop {
            let Some(frame) = frame_stack.last_mut() else {
                return Err(EVMError::Custom("frame stack is empty".to_string()));
            };
            let depth = frame.depth;
            let action = self.frame_call(frame)?;

            let result = match action {
                InterpreterAction::Call { inputs } => {
                    match self.frame_init(FrameInput::Call(inputs), depth + 1)? {
                        ItemOrResult::Item(new_frame) => {
                            frame_stack.push(new_frame);
                            continue;
                        }
                        ItemOrResult::Result(result) => result,
                    }
                }
                InterpreterAction::Create { inputs } => {
                    match self.frame_init(FrameInput::Create(inputs), depth + 1)? {
                        ItemOrResult::Item(new_frame) => {
                            frame_stack.push(new_frame);
                            continue;
                        }
                        ItemOrResult::Result(result) => result,
                    }
                }
                InterpreterAction::Return { result } => {
                    // Remove the frame that returned the result
                    let Some(frame) = frame_stack.pop() else {
                        return Err(EVMError::Custom("frame stack is empty".to_string()));
                    };
                    let frame_result = frame.process_return(&mut self.ctx, result)?;
                    self.frame_end(&frame.input, frame_result)
                }
                InterpreterAction::None => {
                    return Err(EVMError::Custom(
                        "interpreter stopped without an action".to_string(),
                    ))
                }
            };

            let Some(frame) = frame_stack.last_mut() else {
                return Ok(result);
            };
            frame.insert_result(result);
        }
    }

    /// Starts a frame. The inspector can answer the call or create in place of the frame.
    fn frame_init(
        &mut self,
        mut input: FrameInput,
        depth: usize,
    ) -> Result<ItemOrResult<Frame, FrameResult>, EVMError<DB::Error>> {
        let overridden = match &mut input {
            FrameInput::Call(inputs) => self
                .inspector
                .call(&mut self.ctx, inputs)
                .map(FrameResult::Call),
            FrameInput::Create(inputs) => self
                .inspector
                .create(&mut self.ctx, inputs)
                .map(FrameResult::Create),
        };
        if let Some(result) = overridden {
            return Ok(ItemOrResult::Result(self.frame_end(&input, result)));
        }

        match Frame::init(&mut self.ctx, &self.precompiles, depth, &input)? {
            ItemOrResult::Item(mut frame) => {
                self.inspector
                    .initialize_interp(&mut frame.interpreter, &mut self.ctx);
                Ok(ItemOrResult::Item(frame))
            }
            ItemOrResult::Result(result) => {
                Ok(ItemOrResult::Result(self.frame_end(&input, result)))
            }
        }
    }

    /// Runs the frame until it returns or asks for a sub call.
    fn frame_call(
        &mut self,
        frame: &mut Frame,
    ) -> Result<InterpreterAction, EVMError<DB::Error>> {
        let action = run_interpreter(
            &mut frame.interpreter,
            &self.instruction_table,
            &mut self.ctx,
            &mut self.inspector,
        );
        // A database failure inside an instruction halts the frame and is surfaced here.
        self.ctx.take_error()?;
        Ok(action)
    }

    fn frame_end(&mut self, input: &FrameInput, mut result: FrameResult) -> FrameResult {
        match (input, &mut result) {
            (FrameInput::Call(inputs), FrameResult::Call(outcome)) => {
                self.inspector.call_end(&mut self.ctx, inputs, outcome)
            }
            (FrameInput::Create(inputs), FrameResult::Create(outcome)) => {
                self.inspector.create_end(&mut self.ctx, inputs, outcome)
            }
            // inputs and results always pair up
            _ => {}
        }
        result
    }
}

/// Steps the interpreter with the inspector hooks around every instruction.
fn run_interpreter<DB: Database, INSP: Inspector<DB>>(
    interp: &mut Interpreter,
    table: &InstructionTable<Context<DB>>,
    ctx: &mut Context<DB>,
    inspector: &mut INSP,
) -> InterpreterAction {
    interp.next_action = InterpreterAction::None;
    while interp.instruction_result == InstructionResult::Continue {
        inspector.step(interp, ctx);
        if interp.instruction_result != InstructionResult::Continue {
            break;
        }

        let log_count = ctx.journaled_state.logs.len();
        let selfdestruct = (interp.current_opcode() == opcode::SELFDESTRUCT)
            .then(|| {
                let contract = interp.contract.target_address;
                let target = interp.stack().peek(0).ok()?.into_address();
                let balance = ctx
                    .journaled_state
                    .account(contract)
                    .map(|account| account.info.balance)
                    .unwrap_or_default();
                Some((contract, target, balance))
            })
            .flatten();

        interp.step(table, ctx);

        if ctx.journaled_state.logs.len() > log_count {
            let logs = ctx.journaled_state.logs[log_count..].to_vec();
            for log in &logs {
                inspector.log(interp, ctx, log);
            }
        }
        if let Some((contract, target, value)) = selfdestruct {
            if interp.instruction_result == InstructionResult::SelfDestruct {
                inspector.selfdestruct(contract, target, value);
            }
        }

        inspector.step_end(interp, ctx);
    }
    interp.take_next_action()
}

#[cfg(test)]
mod tests {
    use super::*;
    use context::{Env, ExecutionResult, InvalidTransaction, Output};
    use database::InMemoryDB;
    use interpreter::{bytecode::Bytecode, CallOutcome};
    use primitives::{address, bytes, Address, Bytes, Log, U256};
    use state::AccountInfo;

    const CALLER: Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
    const TARGET: Address = address!("1000000000000000000000000000000000000000");

    fn evm_with_code(code: Bytes) -> MainnetEvm<InMemoryDB> {
        let mut db = InMemoryDB::default();
        db.insert_account_info(CALLER, AccountInfo::from_balance(U256::from(1_000_000_000u64)));
        db.insert_account_info(TARGET, AccountInfo::from_bytecode(Bytecode::new_raw(code)));
        let mut ctx = Context::new(db, Env::default());
        ctx.env.tx.caller = CALLER;
        ctx.env.tx.transact_to = TxKind::Call(TARGET);
        ctx.env.tx.gas_limit = 100_000;
        MainnetEvm::new(ctx, NoOpInspector)
    }

    fn slot(evm: &MainnetEvm<InMemoryDB>, address: Address, key: u64) -> U256 {
        evm.ctx
            .journaled_state
            .account(address)
            .and_then(|account| account.storage.get(&U256::from(key)))
            .map(|slot| slot.present_value)
            .unwrap_or_default()
    }

    #[derive(Debug, Default)]
    struct CountInspector {
        steps: usize,
        calls: usize,
        call_ends: usize,
        logs: Vec<Log>,
        selfdestructs: Vec<(Address, Address, U256)>,
    }

    impl<DB: Database> Inspector<DB> for CountInspector {
        fn step(&mut self, _: &mut Interpreter, _: &mut Context<DB>) {
            self.steps += 1;
        }

        fn log(&mut self, _: &mut Interpreter, _: &mut Context<DB>, log: &Log) {
            self.logs.push(log.clone());
        }

        fn call(&mut self, _: &mut Context<DB>, _: &mut CallInputs) -> Option<CallOutcome> {
            self.calls += 1;
            None
        }

        fn call_end(&mut self, _: &mut Context<DB>, _: &CallInputs, _: &mut CallOutcome) {
            self.call_ends += 1;
        }

        fn selfdestruct(&mut self, contract: Address, target: Address, value: U256) {
            self.selfdestructs.push((contract, target, value));
        }
    }

    #[test]
    fn call_returns_output() {
        // mstore(0, 42) return(0, 32)
        let mut evm = evm_with_code(bytes!("602a60005260206000f3"));
        let ResultAndState { result, .. } = evm.transact().unwrap();
        assert_eq!(
            result.output(),
            Some(&Bytes::from(U256::from(42).to_be_bytes::<32>()))
        );
        assert_eq!(result.gas_used(), 21_018);
    }

    #[test]
    fn transact_leaves_state_untouched() {
        // sstore(0, 1)
        let mut evm = evm_with_code(bytes!("600160005500"));
        let ResultAndState { result, state } = evm.transact().unwrap();
        assert!(result.is_success());
        assert_eq!(
            state[&TARGET].storage[&U256::ZERO].present_value,
            U256::from(1)
        );
        assert_eq!(state[&CALLER].info.nonce, 1);

        assert_eq!(slot(&evm, TARGET, 0), U256::ZERO);
        assert_eq!(evm.ctx.journaled_state.account(CALLER).unwrap().info.nonce, 0);
        assert!(!evm.ctx.journaled_state.has_open_checkpoints());

        evm.transact_commit().unwrap();
        assert_eq!(slot(&evm, TARGET, 0), U256::from(1));
        assert_eq!(evm.ctx.journaled_state.account(CALLER).unwrap().info.nonce, 1);
    }

    #[test]
    fn revert_drops_logs() {
        // log0(0, 0) revert(0, 0)
        let mut evm = evm_with_code(bytes!("60006000a060006000fd"));
        let ResultAndState { result, .. } = evm.transact().unwrap();
        assert_eq!(
            result,
            ExecutionResult::Revert {
                gas_used: 21_387,
                output: Bytes::new()
            }
        );

        // log0(0, 0) stop
        let mut evm = evm_with_code(bytes!("60006000a000"));
        let ResultAndState { result, .. } = evm.transact().unwrap();
        assert_eq!(result.logs().len(), 1);
        assert_eq!(result.logs()[0].address, TARGET);
    }

    #[test]
    fn halt_consumes_gas_limit() {
        let mut evm = evm_with_code(bytes!("fe"));
        let ResultAndState { result, .. } = evm.transact().unwrap();
        assert!(result.is_halt());
        assert_eq!(result.gas_used(), 100_000);
    }

    #[test]
    fn deploy_from_fresh_caller() {
        // mstore8(0, 0x2a) return(0, 1)
        let mut evm = evm_with_code(Bytes::new());
        evm.ctx.env.tx.transact_to = TxKind::Create;
        evm.ctx.env.tx.data = bytes!("602a60005360016000f3");
        let ResultAndState { result, state } = evm.transact_commit().unwrap();

        let deployed = address!("3e4ea2156166390f880071d94458efb098473311");
        assert_eq!(
            result,
            ExecutionResult::Success {
                reason: interpreter::SuccessReason::Return,
                gas_used: result.gas_used(),
                gas_refunded: 0,
                logs: Vec::new(),
                output: Output::Create(bytes!("2a"), Some(deployed)),
            }
        );
        let code = state[&deployed].info.code.as_ref().unwrap();
        assert_eq!(code.original_bytes(), bytes!("2a"));
        assert_eq!(state[&CALLER].info.nonce, 1);
        assert_eq!(state[&deployed].info.nonce, 1);
    }

    #[test]
    fn lack_of_funds_is_a_transaction_error() {
        let mut evm = evm_with_code(Bytes::new());
        evm.ctx.env.tx.gas_price = U256::from(1_000_000);
        let err = evm.transact().unwrap_err();
        assert!(matches!(
            err,
            EVMError::Transaction(InvalidTransaction::LackOfFundForMaxFee { .. })
        ));
        assert!(!evm.ctx.journaled_state.has_open_checkpoints());
    }

    #[test]
    fn state_validation_runs_before_the_checkpoint() {
        let mut evm = evm_with_code(Bytes::new());
        let journal = &mut evm.ctx.journaled_state;
        let before = journal.checkpoint();
        journal.checkpoint_revert(before).unwrap();

        evm.ctx.env.tx.nonce = Some(5);
        let err = evm.transact().unwrap_err();
        assert_eq!(
            err,
            EVMError::Transaction(InvalidTransaction::NonceTooHigh { tx: 5, state: 0 })
        );

        // no checkpoint id was handed out for the rejected transaction
        let after = evm.ctx.journaled_state.checkpoint();
        assert_eq!(after.id(), before.id() + 1);
    }

    #[derive(Debug, Default)]
    struct LastResult(Option<ExecutionResult>);

    impl<DB: Database> Inspector<DB> for LastResult {
        fn transaction_end(&mut self, _: &mut Context<DB>, result: &ExecutionResult) {
            self.0 = Some(result.clone());
        }
    }

    #[test]
    fn inspector_sees_final_result() {
        let mut evm = evm_with_code(Bytes::new()).with_inspector(LastResult::default());
        evm.ctx.env.tx.value = U256::from(1);
        let ResultAndState { result, .. } = evm.transact().unwrap();
        assert_eq!(result.gas_used(), 21_000);
        assert_eq!(evm.inspector.0, Some(result));

        let mut evm = evm_with_code(Bytes::new()).with_inspector(LastResult::default());
        evm.ctx.env.tx.gas_price = U256::from(1_000_000);
        evm.transact().unwrap_err();
        assert_eq!(evm.inspector.0, None);
    }

    #[test]
    fn fees_move_to_coinbase() {
        let coinbase = Address::with_last_byte(0xcb);
        let mut evm = evm_with_code(Bytes::new());
        evm.ctx.env.block.coinbase = coinbase;
        evm.ctx.env.tx.gas_price = U256::from(2);
        let ResultAndState { result, state } = evm.transact().unwrap();
        assert_eq!(result.gas_used(), 21_000);
        assert_eq!(
            state[&CALLER].info.balance,
            U256::from(1_000_000_000u64 - 42_000)
        );
        assert_eq!(state[&coinbase].info.balance, U256::from(42_000));
    }

    #[test]
    fn inspector_sees_precompile_call() {
        // mstore(0, 42) call(gas, 4, 0, 0, 32, 0, 32) return(0, 32)
        let code = bytes!("602a6000526020600060206000600060045af160206000f3");
        let mut evm = evm_with_code(code).with_inspector(CountInspector::default());
        let ResultAndState { result, .. } = evm.transact().unwrap();

        assert_eq!(
            result.output(),
            Some(&Bytes::from(U256::from(42).to_be_bytes::<32>()))
        );
        assert_eq!(evm.inspector.calls, 2);
        assert_eq!(evm.inspector.call_ends, 2);
        assert_eq!(evm.inspector.steps, 14);
    }

    #[test]
    fn inspector_sees_logs_and_selfdestruct() {
        let beneficiary = Address::with_last_byte(0x33);
        // log0(0, 0) selfdestruct(0x..33)
        let mut code = bytes!("60006000a073").to_vec();
        code.extend_from_slice(beneficiary.as_slice());
        code.push(0xff);
        let mut evm = evm_with_code(code.into()).with_inspector(CountInspector::default());
        let info = evm.ctx.db.cache.accounts[&TARGET].info.clone();
        evm.ctx.db.insert_account_info(
            TARGET,
            AccountInfo {
                balance: U256::from(5),
                ..info
            },
        );
        let ResultAndState { result, .. } = evm.transact().unwrap();

        assert!(result.is_success());
        assert_eq!(evm.inspector.logs.len(), 1);
        assert_eq!(
            evm.inspector.selfdestructs,
            vec![(TARGET, beneficiary, U256::from(5))]
        );
    }
}
