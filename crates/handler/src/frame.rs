//! Call frames: creating them from call or create inputs and folding their results back.
use context::{Context, EVMError, JournalCheckpoint, Output, TransferError};
use database_interface::Database;
use interpreter::{
    bytecode::Bytecode, gas, CallInputs, CallOutcome, CallValue, Contract, CreateInputs,
    CreateOutcome, Gas, InstructionResult, Interpreter, InterpreterResult,
};
use precompile::{PrecompileError, Precompiles};
use primitives::{
    constants::CALL_STACK_LIMIT,
    hardfork::SpecId::{self, HOMESTEAD, LONDON, SPURIOUS_DRAGON},
    Address, Bytes,
};
use std::{boxed::Box, ops::Range};
use tracing::trace;

/// Either a new frame to run or a result that needs no interpreter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemOrResult<ITEM, RES> {
    /// New item to execute.
    Item(ITEM),
    /// Result of an item that finished without executing.
    Result(RES),
}

/// Inputs that start a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameInput {
    /// `CALL`, `CALLCODE`, `DELEGATECALL`, `STATICCALL` or a call transaction.
    Call(Box<CallInputs>),
    /// `CREATE`, `CREATE2` or a create transaction.
    Create(Box<CreateInputs>),
}

/// Data the frame keeps until it returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameData {
    /// Call frame.
    Call {
        /// Where the parent wants the return data.
        return_memory_range: Range<usize>,
    },
    /// Create frame.
    Create {
        /// Address the code is deployed to.
        created_address: Address,
    },
}

/// Outcome of a finished frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameResult {
    /// Call outcome.
    Call(CallOutcome),
    /// Create outcome.
    Create(CreateOutcome),
}

impl FrameResult {
    /// Returns the [`Output`] of the frame.
    pub fn output(&self) -> Output {
        match self {
            Self::Call(outcome) => Output::Call(outcome.result.output.clone()),
            Self::Create(outcome) => Output::Create(outcome.result.output.clone(), outcome.address),
        }
    }

    /// Returns the gas of the frame.
    pub fn gas(&self) -> &Gas {
        &self.interpreter_result().gas
    }

    /// Returns mutable reference to the gas of the frame.
    pub fn gas_mut(&mut self) -> &mut Gas {
        &mut self.interpreter_result_mut().gas
    }

    /// Returns the interpreter result of the frame.
    pub fn interpreter_result(&self) -> &InterpreterResult {
        match self {
            Self::Call(outcome) => &outcome.result,
            Self::Create(outcome) => &outcome.result,
        }
    }

    /// Returns mutable reference to the interpreter result.
    pub fn interpreter_result_mut(&mut self) -> &mut InterpreterResult {
        match self {
            Self::Call(outcome) => &mut outcome.result,
            Self::Create(outcome) => &mut outcome.result,
        }
    }

    /// Returns the instruction result.
    pub fn instruction_result(&self) -> InstructionResult {
        self.interpreter_result().result
    }
}

/// A call or create frame with its own interpreter and journal checkpoint.
#[derive(Debug)]
pub struct Frame {
    /// Data of the frame.
    pub data: FrameData,
    /// Input the frame was started with.
    pub input: FrameInput,
    /// Depth of the frame, the first frame has depth 0.
    pub depth: usize,
    /// Checkpoint opened for this frame.
    pub checkpoint: JournalCheckpoint,
    /// Interpreter.
    pub interpreter: Interpreter,
}

impl Frame {
    /// Starts a frame, or returns its result right away when there is no code to run.
    pub fn init<DB: Database>(
        ctx: &mut Context<DB>,
        precompiles: &Precompiles,
        depth: usize,
        input: &FrameInput,
    ) -> Result<ItemOrResult<Self, FrameResult>, EVMError<DB::Error>> {
        match input {
            FrameInput::Call(inputs) => Self::make_call_frame(ctx, precompiles, depth, inputs),
            FrameInput::Create(inputs) => Self::make_create_frame(ctx, depth, inputs),
        }
    }

    fn make_call_frame<DB: Database>(
        ctx: &mut Context<DB>,
        precompiles: &Precompiles,
        depth: usize,
        inputs: &CallInputs,
    ) -> Result<ItemOrResult<Self, FrameResult>, EVMError<DB::Error>> {
        let gas = Gas::new(inputs.gas_limit);
        let return_result = |instruction_result: InstructionResult| {
            Ok(ItemOrResult::Result(FrameResult::Call(CallOutcome::new(
                InterpreterResult::new(instruction_result, Bytes::new(), gas),
                inputs.return_memory_offset.clone(),
            ))))
        };

        // Check depth
        if depth > CALL_STACK_LIMIT as usize {
            return return_result(InstructionResult::CallTooDeep);
        }

        let Context {
            env,
            journaled_state,
            db,
            ..
        } = ctx;

        // Make account warm and loaded
        journaled_state.load_account(inputs.bytecode_address, db)?;

        // Create subroutine checkpoint
        let checkpoint = journaled_state.checkpoint();

        // Touch address. For "EIP-158 State Clear", this will erase empty accounts.
        if let CallValue::Transfer(value) = inputs.value {
            // Target gets touched even if the transferred value is zero.
            if let Some(error) =
                journaled_state.transfer(inputs.caller, inputs.target_address, value, db)?
            {
                journaled_state.checkpoint_revert(checkpoint)?;
                return return_result(transfer_error_result(error));
            }
        }

        if let Some(precompile) = precompiles.get(&inputs.bytecode_address) {
            let mut result = InterpreterResult::new(InstructionResult::Return, Bytes::new(), gas);
            match precompile(&inputs.input, inputs.gas_limit) {
                Ok(output) => {
                    if result.gas.record_cost(output.gas_used) {
                        result.output = output.bytes;
                    } else {
                        result.result = InstructionResult::PrecompileOOG;
                    }
                }
                Err(PrecompileError::OutOfGas) => {
                    result.result = InstructionResult::PrecompileOOG;
                }
            }
            if result.is_ok() {
                journaled_state.checkpoint_commit(checkpoint)?;
            } else {
                journaled_state.checkpoint_revert(checkpoint)?;
            }
            return Ok(ItemOrResult::Result(FrameResult::Call(CallOutcome::new(
                result,
                inputs.return_memory_offset.clone(),
            ))));
        }

        let account = journaled_state.load_code(inputs.bytecode_address, db)?;
        let bytecode = account.data.info.code.clone().unwrap_or_default();

        // Returns success if bytecode is empty.
        if bytecode.is_empty() {
            journaled_state.checkpoint_commit(checkpoint)?;
            return return_result(InstructionResult::Stop);
        }

        let contract = Contract::new(
            inputs.input.clone(),
            bytecode,
            inputs.target_address,
            Some(inputs.bytecode_address),
            inputs.caller,
            inputs.value.get(),
        );
        Ok(ItemOrResult::Item(Self {
            data: FrameData::Call {
                return_memory_range: inputs.return_memory_offset.clone(),
            },
            input: FrameInput::Call(Box::new(inputs.clone())),
            depth,
            checkpoint,
            interpreter: Interpreter::new(contract, inputs.gas_limit, inputs.is_static, env.cfg.spec)
                .with_memory_limit(env.cfg.memory_limit),
        }))
    }

    fn make_create_frame<DB: Database>(
        ctx: &mut Context<DB>,
        depth: usize,
        inputs: &CreateInputs,
    ) -> Result<ItemOrResult<Self, FrameResult>, EVMError<DB::Error>> {
        let return_error = |e| {
            Ok(ItemOrResult::Result(FrameResult::Create(CreateOutcome::new(
                InterpreterResult::new_with_gas_limit(e, inputs.gas_limit),
                None,
            ))))
        };

        // Check depth
        if depth > CALL_STACK_LIMIT as usize {
            return return_error(InstructionResult::CallTooDeep);
        }

        let Context {
            env,
            journaled_state,
            db,
            ..
        } = ctx;

        // Fetch balance of caller.
        let caller = journaled_state.load_account(inputs.caller, db)?;
        if caller.data.info.balance < inputs.value {
            return return_error(InstructionResult::OutOfFunds);
        }
        let old_nonce = caller.data.info.nonce;

        // Increase nonce of caller and check if it overflows
        if journaled_state.inc_nonce(inputs.caller).is_none() {
            return return_error(InstructionResult::NonceOverflow);
        }

        let created_address = inputs.created_address(old_nonce);

        // Load account so it needs to be marked as warm for access list.
        journaled_state.load_account(created_address, db)?;

        // Create account, transfer funds and make the journal checkpoint.
        let checkpoint = match journaled_state.create_account_checkpoint(
            inputs.caller,
            created_address,
            inputs.value,
        ) {
            Ok(checkpoint) => checkpoint,
            Err(e) => return return_error(transfer_error_result(e)),
        };
        trace!(target: "revsim::frame", %created_address, depth, "create frame");

        let contract = Contract::new(
            Bytes::new(),
            Bytecode::new_raw(inputs.init_code.clone()),
            created_address,
            None,
            inputs.caller,
            inputs.value,
        );
        Ok(ItemOrResult::Item(Self {
            data: FrameData::Create { created_address },
            input: FrameInput::Create(Box::new(inputs.clone())),
            depth,
            checkpoint,
            interpreter: Interpreter::new(contract, inputs.gas_limit, false, env.cfg.spec)
                .with_memory_limit(env.cfg.memory_limit),
        }))
    }

    /// Closes the frame's checkpoint and wraps the interpreter result into a [`FrameResult`].
    ///
    /// Create frames deposit the returned code here.
    pub fn process_return<DB: Database>(
        &self,
        ctx: &mut Context<DB>,
        mut result: InterpreterResult,
    ) -> Result<FrameResult, EVMError<DB::Error>> {
        Ok(match &self.data {
            FrameData::Call {
                return_memory_range,
            } => {
                if result.is_ok() {
                    ctx.journaled_state.checkpoint_commit(self.checkpoint)?;
                } else {
                    ctx.journaled_state.checkpoint_revert(self.checkpoint)?;
                }
                FrameResult::Call(CallOutcome::new(result, return_memory_range.clone()))
            }
            FrameData::Create { created_address } => {
                let max_code_size = ctx.env.cfg.max_code_size();
                let spec = ctx.env.cfg.spec;
                return_create(
                    ctx,
                    self.checkpoint,
                    &mut result,
                    *created_address,
                    max_code_size,
                    spec,
                )?;
                FrameResult::Create(CreateOutcome::new(result, Some(*created_address)))
            }
        })
    }

    /// Resumes this frame with the result of its child.
    pub fn insert_result(&mut self, result: FrameResult) {
        match result {
            FrameResult::Call(outcome) => self.interpreter.insert_call_outcome(outcome),
            FrameResult::Create(outcome) => self.interpreter.insert_create_outcome(outcome),
        }
    }
}

/// Validates the returned init code result and deploys the code.
pub fn return_create<DB: Database>(
    ctx: &mut Context<DB>,
    checkpoint: JournalCheckpoint,
    interpreter_result: &mut InterpreterResult,
    address: Address,
    max_code_size: usize,
    spec_id: SpecId,
) -> Result<(), EVMError<DB::Error>> {
    let journal = &mut ctx.journaled_state;
    // If return is not ok revert and return.
    if !interpreter_result.result.is_ok() {
        journal.checkpoint_revert(checkpoint)?;
        return Ok(());
    }

    // EIP-3541: Reject new contract code starting with the 0xEF byte
    if spec_id.is_enabled_in(LONDON) && interpreter_result.output.first() == Some(&0xEF) {
        journal.checkpoint_revert(checkpoint)?;
        interpreter_result.result = InstructionResult::CreateContractStartingWithEF;
        return Ok(());
    }

    // EIP-170: Contract code size limit
    if spec_id.is_enabled_in(SPURIOUS_DRAGON) && interpreter_result.output.len() > max_code_size {
        journal.checkpoint_revert(checkpoint)?;
        interpreter_result.result = InstructionResult::CreateContractSizeLimit;
        return Ok(());
    }

    let gas_for_code = interpreter_result.output.len() as u64 * gas::CODEDEPOSIT;
    if !interpreter_result.gas.record_cost(gas_for_code) {
        // EIP-2 point 3: If contract creation does not have enough gas to pay for the
        // final gas fee for adding the contract code to the state, the contract
        // creation fails (i.e. goes out-of-gas) rather than leaving an empty contract.
        if spec_id.is_enabled_in(HOMESTEAD) {
            journal.checkpoint_revert(checkpoint)?;
            interpreter_result.result = InstructionResult::OutOfGas;
            return Ok(());
        } else {
            interpreter_result.output = Bytes::new();
        }
    }

    // If we have enough gas we can commit changes.
    journal.checkpoint_commit(checkpoint)?;

    let bytecode = Bytecode::new_raw(interpreter_result.output.clone());
    journal.set_code(address, bytecode, &mut ctx.db)?;

    interpreter_result.result = InstructionResult::Return;
    Ok(())
}

fn transfer_error_result(error: TransferError) -> InstructionResult {
    match error {
        TransferError::OutOfFunds => InstructionResult::OutOfFunds,
        TransferError::OverflowPayment => InstructionResult::OverflowPayment,
        TransferError::CreateCollision => InstructionResult::CreateCollision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MainnetEvm;
    use context::{Env, ResultAndState};
    use database::InMemoryDB;
    use inspector::inspectors::NoOpInspector;
    use interpreter::{CallScheme, CreateScheme};
    use primitives::{address, bytes, constants::MAX_CODE_SIZE, TxKind, U256};
    use rstest::rstest;
    use state::AccountInfo;

    const CALLER: Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
    const TARGET: Address = address!("1000000000000000000000000000000000000000");
    const CHILD: Address = address!("20000000000000000000000000000000000000c1");
    const CREATED: Address = address!("30000000000000000000000000000000000000c0");

    fn evm_with(accounts: &[(Address, Bytes)]) -> MainnetEvm<InMemoryDB> {
        let mut db = InMemoryDB::default();
        db.insert_account_info(CALLER, AccountInfo::from_balance(U256::from(1_000_000u64)));
        for (address, code) in accounts {
            db.insert_account_info(
                *address,
                AccountInfo::from_bytecode(Bytecode::new_raw(code.clone())),
            );
        }
        let mut ctx = Context::new(db, Env::default());
        ctx.env.tx.caller = CALLER;
        ctx.env.tx.transact_to = TxKind::Call(TARGET);
        ctx.env.tx.gas_limit = 1_000_000;
        MainnetEvm::new(ctx, NoOpInspector)
    }

    fn slot(state: &state::EvmState, address: Address, key: u64) -> U256 {
        state
            .get(&address)
            .and_then(|account| account.storage.get(&U256::from(key)))
            .map(|slot| slot.present_value)
            .unwrap_or_default()
    }

    fn call_inputs(gas_limit: u64) -> FrameInput {
        FrameInput::Call(Box::new(CallInputs {
            input: Bytes::new(),
            return_memory_offset: 0..0,
            gas_limit,
            bytecode_address: TARGET,
            target_address: TARGET,
            caller: CALLER,
            value: CallValue::Transfer(U256::ZERO),
            scheme: CallScheme::Call,
            is_static: false,
        }))
    }

    fn create_inputs(gas_limit: u64) -> FrameInput {
        FrameInput::Create(Box::new(CreateInputs {
            caller: CALLER,
            scheme: CreateScheme::Create,
            value: U256::ZERO,
            init_code: Bytes::new(),
            gas_limit,
        }))
    }

    fn immediate_result(depth: usize, input: FrameInput) -> Option<FrameResult> {
        let mut ctx = Context::new(InMemoryDB::default(), Env::default());
        let precompiles = Precompiles::new(SpecId::CANCUN);
        match Frame::init(&mut ctx, &precompiles, depth, &input).unwrap() {
            ItemOrResult::Result(result) => {
                assert!(!ctx.journaled_state.has_open_checkpoints());
                Some(result)
            }
            ItemOrResult::Item(_) => None,
        }
    }

    #[test]
    fn frames_past_the_depth_limit_do_not_start() {
        let too_deep = CALL_STACK_LIMIT as usize + 1;

        let call = immediate_result(too_deep, call_inputs(1_000)).unwrap();
        assert_eq!(call.instruction_result(), InstructionResult::CallTooDeep);
        assert_eq!(call.gas().remaining(), 1_000);

        let create = immediate_result(too_deep, create_inputs(1_000)).unwrap();
        assert_eq!(create.instruction_result(), InstructionResult::CallTooDeep);

        // the deepest allowed frame still runs; an account without code stops right away
        let call = immediate_result(CALL_STACK_LIMIT as usize, call_inputs(1_000)).unwrap();
        assert_eq!(call.instruction_result(), InstructionResult::Stop);
    }

    #[test]
    fn precompiles_charge_their_price_or_halt() {
        let identity = precompile::u64_to_address(4);
        let input = |gas_limit: u64| {
            FrameInput::Call(Box::new(CallInputs {
                input: bytes!("616263"),
                return_memory_offset: 0..0,
                gas_limit,
                bytecode_address: identity,
                target_address: identity,
                caller: CALLER,
                value: CallValue::Transfer(U256::ZERO),
                scheme: CallScheme::StaticCall,
                is_static: true,
            }))
        };

        let done = immediate_result(0, input(100)).unwrap();
        assert_eq!(done.instruction_result(), InstructionResult::Return);
        assert_eq!(done.interpreter_result().output, bytes!("616263"));
        assert_eq!(done.gas().remaining(), 100 - 18);

        let halted = immediate_result(0, input(17)).unwrap();
        assert_eq!(halted.instruction_result(), InstructionResult::PrecompileOOG);
        assert!(halted.interpreter_result().output.is_empty());
    }

    #[test]
    fn reverted_child_leaves_parent_changes() {
        // sstore(0, 1) revert(0, 0)
        let child = bytes!("600160005560006000fd");
        // sstore(2, call(gas, CHILD, 0, 0, 0, 0, 0)) sstore(1, 2) stop
        let mut parent = bytes!("60006000600060006000").to_vec();
        parent.push(0x73);
        parent.extend_from_slice(CHILD.as_slice());
        parent.extend_from_slice(&bytes!("5af1600255600260015500"));
        let mut evm = evm_with(&[(TARGET, parent.into()), (CHILD, child)]);

        let ResultAndState { result, state } = evm.transact().unwrap();
        assert!(result.is_success());
        assert_eq!(slot(&state, CHILD, 0), U256::ZERO);
        assert_eq!(slot(&state, TARGET, 2), U256::ZERO);
        assert_eq!(slot(&state, TARGET, 1), U256::from(2));
    }

    #[test]
    fn create2_address_depends_on_salt_and_code() {
        // create2(0, 0, 1, 7) with the init code 0x00, then return the address
        let code = bytes!("6007600160006000f560005260206000f3");
        let mut evm = evm_with(&[(TARGET, code)]);

        let ResultAndState { result, state } = evm.transact().unwrap();
        let expected = TARGET.create2_from_code(U256::from(7).to_be_bytes::<32>(), [0x00]);
        assert_eq!(
            result.output(),
            Some(&Bytes::from(expected.into_word().0.to_vec()))
        );
        assert_eq!(state[&expected].info.nonce, 1);
        assert_eq!(state[&TARGET].info.nonce, 2);
    }

    #[test]
    fn create2_matches_eip1014_vector() {
        let inputs = CreateInputs {
            caller: Address::ZERO,
            scheme: CreateScheme::Create2 { salt: U256::ZERO },
            init_code: bytes!("00"),
            ..Default::default()
        };
        assert_eq!(
            inputs.created_address(0),
            address!("4D1A2e2bB4F88F0250f26Ffff098B0b30B26BF38")
        );
    }

    /// Runs `return_create` for init code that returned `output` with `gas_limit` left.
    fn deposit(
        spec: SpecId,
        output: Bytes,
        gas_limit: u64,
    ) -> (InterpreterResult, Context<InMemoryDB>) {
        let mut ctx = Context::new(InMemoryDB::default(), Env::default());
        ctx.journaled_state.load_account(CREATED, &mut ctx.db).unwrap();
        let checkpoint = ctx.journaled_state.checkpoint();
        let mut result =
            InterpreterResult::new(InstructionResult::Return, output, Gas::new(gas_limit));
        return_create(&mut ctx, checkpoint, &mut result, CREATED, MAX_CODE_SIZE, spec).unwrap();
        assert!(!ctx.journaled_state.has_open_checkpoints());
        (result, ctx)
    }

    fn deployed_code(ctx: &Context<InMemoryDB>) -> Bytes {
        ctx.journaled_state
            .account(CREATED)
            .and_then(|account| account.info.code.as_ref())
            .map(|code| code.original_bytes())
            .unwrap_or_default()
    }

    #[test]
    fn code_deposit_costs_per_byte() {
        let code = Bytes::from(vec![0x60; 10]);
        let (result, ctx) = deposit(SpecId::CANCUN, code.clone(), 10_000);
        assert_eq!(result.result, InstructionResult::Return);
        assert_eq!(result.gas.spent(), 10 * gas::CODEDEPOSIT);
        assert_eq!(deployed_code(&ctx), code);
    }

    #[test]
    fn code_deposit_out_of_gas() {
        let (result, ctx) = deposit(SpecId::CANCUN, Bytes::from(vec![0x60; 10]), 1_999);
        assert_eq!(result.result, InstructionResult::OutOfGas);
        assert!(deployed_code(&ctx).is_empty());

        // before Homestead the contract is kept, without code
        let (result, ctx) = deposit(SpecId::FRONTIER, Bytes::from(vec![0x60; 10]), 1_999);
        assert_eq!(result.result, InstructionResult::Return);
        assert!(deployed_code(&ctx).is_empty());
    }

    #[rstest]
    #[case(SpecId::CANCUN, MAX_CODE_SIZE, InstructionResult::Return)]
    #[case(SpecId::CANCUN, MAX_CODE_SIZE + 1, InstructionResult::CreateContractSizeLimit)]
    #[case(SpecId::HOMESTEAD, MAX_CODE_SIZE + 1, InstructionResult::Return)]
    fn code_size_limit(
        #[case] spec: SpecId,
        #[case] len: usize,
        #[case] expected: InstructionResult,
    ) {
        let (result, ctx) = deposit(spec, Bytes::from(vec![0x00; len]), 10_000_000);
        assert_eq!(result.result, expected);
        let deployed = if expected == InstructionResult::Return { len } else { 0 };
        assert_eq!(deployed_code(&ctx).len(), deployed);
    }

    #[rstest]
    #[case(SpecId::LONDON, InstructionResult::CreateContractStartingWithEF)]
    #[case(SpecId::BERLIN, InstructionResult::Return)]
    fn code_starting_with_ef(#[case] spec: SpecId, #[case] expected: InstructionResult) {
        let (result, ctx) = deposit(spec, bytes!("ef00"), 10_000);
        assert_eq!(result.result, expected);
        let deployed = if expected == InstructionResult::Return { 2 } else { 0 };
        assert_eq!(deployed_code(&ctx).len(), deployed);
    }
}
