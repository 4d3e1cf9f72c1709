//! # revsim-interpreter
//!
//! Legacy EVM interpreter: gas accounting, stack, memory, the [`Host`] seam and one
//! function per opcode collected into an [`InstructionTable`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

#[macro_use]
mod macros;

pub mod gas;
pub mod host;
mod instruction_result;
pub mod instructions;
pub mod interpreter;
pub mod interpreter_action;
pub mod table;

pub use gas::Gas;
pub use host::{AccountLoad, DummyHost, Host, SStoreResult, SelfDestructResult, StateLoad};
pub use instruction_result::{
    HaltReason, InstructionResult, OutOfGasError, SuccessOrHalt, SuccessReason,
};
pub use interpreter::{num_words, Contract, Interpreter, Memory, Stack};
pub use interpreter_action::{
    CallInputs, CallOutcome, CallScheme, CallValue, CreateInputs, CreateOutcome, CreateScheme,
    InterpreterAction, InterpreterResult,
};
pub use table::{instruction, make_instruction_table, Instruction, InstructionTable};

pub use bytecode;
pub use primitives;
