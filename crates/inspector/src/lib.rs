//! # revsim-inspector
//!
//! Hooks into the execution loop and the inspectors built on them.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

#[cfg(feature = "tracer")]
mod eip3155;
mod gas;
mod inspector;
mod noop;

pub use inspector::Inspector;

/// [Inspector] implementations.
pub mod inspectors {
    #[cfg(feature = "tracer")]
    pub use super::eip3155::TracerEip3155;
    pub use super::gas::GasInspector;
    pub use super::noop::NoOpInspector;
}

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::Inspector;
    use context::{Context, ExecutionResult, Output};
    use database::InMemoryDB;
    use interpreter::{
        bytecode::Bytecode, make_instruction_table, CallInputs, CallOutcome, CallScheme,
        CallValue, Contract, InstructionResult, Interpreter, SuccessOrHalt,
    };
    use primitives::{hardfork::SpecId, Address, Bytes};

    /// Runs `code` as a single top-level call, driving the hooks the way the handler does.
    ///
    /// The transaction result handed to the inspector charges no intrinsic gas.
    pub(crate) fn inspect_bytecode<I: Inspector<InMemoryDB>>(
        code: Bytes,
        gas_limit: u64,
        mut inspector: I,
    ) -> CallOutcome {
        let mut context = Context::<InMemoryDB>::default();
        context.env.tx.gas_limit = gas_limit;
        let target = Address::with_last_byte(0x10);
        let mut inputs = CallInputs {
            input: Bytes::new(),
            return_memory_offset: 0..0,
            gas_limit,
            bytecode_address: target,
            target_address: target,
            caller: Address::with_last_byte(0x20),
            value: CallValue::default(),
            scheme: CallScheme::Call,
            is_static: false,
        };
        assert!(inspector.call(&mut context, &mut inputs).is_none());

        let contract = Contract::new(
            Bytes::new(),
            Bytecode::new_raw(code),
            target,
            Some(target),
            inputs.caller,
            Default::default(),
        );
        let mut interp = Interpreter::new(contract, gas_limit, false, SpecId::CANCUN);
        let table = make_instruction_table::<Context<InMemoryDB>>();
        inspector.initialize_interp(&mut interp, &mut context);
        while interp.instruction_result == InstructionResult::Continue {
            inspector.step(&mut interp, &mut context);
            interp.step(&table, &mut context);
            inspector.step_end(&mut interp, &mut context);
        }
        let result = interp
            .take_next_action()
            .into_result_return()
            .expect("top-level frame returns");

        let mut outcome = CallOutcome::new(result, 0..0);
        inspector.call_end(&mut context, &inputs, &mut outcome);

        let gas_used = gas_limit - outcome.result.gas.remaining();
        let output = outcome.result.output.clone();
        let result = match SuccessOrHalt::from(outcome.result.result) {
            SuccessOrHalt::Success(reason) => ExecutionResult::Success {
                reason,
                gas_used,
                gas_refunded: 0,
                logs: Vec::new(),
                output: Output::Call(output),
            },
            SuccessOrHalt::Revert => ExecutionResult::Revert { gas_used, output },
            SuccessOrHalt::Halt(reason) => ExecutionResult::Halt {
                reason,
                gas_used: gas_limit,
            },
            flag => panic!("unexpected return flag {flag:?}"),
        };
        inspector.transaction_end(&mut context, &result);
        outcome
    }
}
