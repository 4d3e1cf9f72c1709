use auto_impl::auto_impl;
use context::{Context, ExecutionResult};
use database_interface::Database;
use interpreter::{CallInputs, CallOutcome, CreateInputs, CreateOutcome, Interpreter};
use primitives::{Address, Log, U256};

/// EVM [Interpreter] callbacks.
///
/// Every hook defaults to doing nothing. Hooks observe the execution; they may override call
/// outcomes but an inspector that only reads leaves the result unchanged.
#[auto_impl(&mut, Box)]
pub trait Inspector<DB: Database> {
    /// Called before the interpreter runs its first instruction.
    ///
    /// If `interp.instruction_result` is set to anything other than
    /// [`InstructionResult::Continue`](interpreter::InstructionResult::Continue) the frame is
    /// not executed.
    #[inline]
    fn initialize_interp(&mut self, interp: &mut Interpreter, context: &mut Context<DB>) {
        let _ = interp;
        let _ = context;
    }

    /// Called on each step of the interpreter, before the instruction executes.
    ///
    /// To get the current opcode, use `interp.current_opcode()`.
    #[inline]
    fn step(&mut self, interp: &mut Interpreter, context: &mut Context<DB>) {
        let _ = interp;
        let _ = context;
    }

    /// Called after `step` when the instruction has been executed.
    #[inline]
    fn step_end(&mut self, interp: &mut Interpreter, context: &mut Context<DB>) {
        let _ = interp;
        let _ = context;
    }

    /// Called when a log is emitted.
    #[inline]
    fn log(&mut self, interp: &mut Interpreter, context: &mut Context<DB>, log: &Log) {
        let _ = interp;
        let _ = context;
        let _ = log;
    }

    /// Called whenever a call is about to start.
    ///
    /// Returning `Some` skips the call and uses the outcome in its place.
    #[inline]
    fn call(&mut self, context: &mut Context<DB>, inputs: &mut CallInputs) -> Option<CallOutcome> {
        let _ = context;
        let _ = inputs;
        None
    }

    /// Called when a call has concluded. The outcome may be modified.
    #[inline]
    fn call_end(
        &mut self,
        context: &mut Context<DB>,
        inputs: &CallInputs,
        outcome: &mut CallOutcome,
    ) {
        let _ = context;
        let _ = inputs;
        let _ = outcome;
    }

    /// Called when a contract is about to be created.
    ///
    /// Returning `Some` skips the creation and uses the outcome in its place.
    #[inline]
    fn create(
        &mut self,
        context: &mut Context<DB>,
        inputs: &mut CreateInputs,
    ) -> Option<CreateOutcome> {
        let _ = context;
        let _ = inputs;
        None
    }

    /// Called when a creation has concluded. The outcome may be modified.
    #[inline]
    fn create_end(
        &mut self,
        context: &mut Context<DB>,
        inputs: &CreateInputs,
        outcome: &mut CreateOutcome,
    ) {
        let _ = context;
        let _ = inputs;
        let _ = outcome;
    }

    /// Called once a transaction has executed, with its final result.
    ///
    /// Not called for transactions rejected by validation.
    #[inline]
    fn transaction_end(&mut self, context: &mut Context<DB>, result: &ExecutionResult) {
        let _ = context;
        let _ = result;
    }

    /// Called when a contract has been self-destructed with funds transferred to target.
    #[inline]
    fn selfdestruct(&mut self, contract: Address, target: Address, value: U256) {
        let _ = contract;
        let _ = target;
        let _ = value;
    }
}
