//! # revsim-bytecode
//!
//! Legacy EVM bytecode with its jump-destination table, plus the opcode table
//! shared by the interpreter and the tracer.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

mod bytecode;
mod jump_map;
pub mod opcode;

pub use bytecode::Bytecode;
pub use jump_map::{analyze_legacy, JumpTable};
pub use opcode::{OpCode, OpCodeInfo, OPCODE_INFO};
