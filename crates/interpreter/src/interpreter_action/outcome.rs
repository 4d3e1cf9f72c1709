//! What a finished child frame hands back to the frame that started it.
use crate::{InstructionResult, InterpreterResult};
use core::ops::Range;
use primitives::Address;

/// Result of a call frame, and the parent memory its return data goes to.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallOutcome {
    /// How the call ended, with its output and leftover gas.
    pub result: InterpreterResult,
    /// Parent memory that receives the return data, truncated to its length.
    pub memory_offset: Range<usize>,
}

impl CallOutcome {
    /// Pairs a call result with its return data range.
    pub fn new(result: InterpreterResult, memory_offset: Range<usize>) -> Self {
        Self {
            result,
            memory_offset,
        }
    }

    /// How the call ended.
    pub fn instruction_result(&self) -> InstructionResult {
        self.result.result
    }
}

/// Result of a create frame.
///
/// `address` is where the code was meant to go. Only a successful result deployed there.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreateOutcome {
    /// How the init code ended, with its output and leftover gas.
    pub result: InterpreterResult,
    /// Target address, `None` when the frame never got that far.
    pub address: Option<Address>,
}

impl CreateOutcome {
    /// Pairs a create result with its target address.
    pub fn new(result: InterpreterResult, address: Option<Address>) -> Self {
        Self { result, address }
    }

    /// How the init code ended.
    pub fn instruction_result(&self) -> InstructionResult {
        self.result.result
    }

    /// Address of the deployed contract, if the creation succeeded.
    pub fn created_address(&self) -> Option<Address> {
        self.address.filter(|_| self.result.result.is_ok())
    }
}
