mod contract;
mod memory;
mod stack;

pub use contract::Contract;
pub use memory::{num_words, Memory};
pub use stack::Stack;

use crate::{
    gas, return_ok, return_revert, CallOutcome, CreateOutcome, Gas, Host, InstructionResult,
    InstructionTable, InterpreterAction, InterpreterResult,
};
use bytecode::opcode;
use core::cmp::min;
use primitives::{hardfork::SpecId, Bytes, U256};

/// Default upper bound of a frame's memory in bytes.
pub const DEFAULT_MEMORY_LIMIT: u64 = (1 << 32) - 1;

/// State of one call frame.
#[derive(Debug)]
pub struct Interpreter {
    /// Contract information and invoking data
    pub contract: Contract,
    /// The current instruction pointer, an index into the padded code.
    pub pc: usize,
    /// The execution control flag. If this is not set to `Continue`, the interpreter will stop
    /// execution.
    pub instruction_result: InstructionResult,
    /// The gas state.
    pub gas: Gas,
    /// Frame memory.
    pub memory: Memory,
    /// Stack.
    pub stack: Stack,
    /// The return data buffer for internal calls.
    pub return_data_buffer: Bytes,
    /// Whether the interpreter is in "staticcall" mode, meaning no state changes can happen.
    pub is_static: bool,
    /// Active hardfork.
    pub spec_id: SpecId,
    /// Memory size above which expansion halts with `MemoryLimitOOG`.
    pub memory_limit: u64,
    /// Set by `CALL*`, `CREATE*`, `RETURN` and `REVERT`.
    pub next_action: InterpreterAction,
}

impl Interpreter {
    /// Create new interpreter
    pub fn new(contract: Contract, gas_limit: u64, is_static: bool, spec_id: SpecId) -> Self {
        Self {
            contract,
            pc: 0,
            instruction_result: InstructionResult::Continue,
            gas: Gas::new(gas_limit),
            memory: Memory::new(),
            stack: Stack::new(),
            return_data_buffer: Bytes::new(),
            is_static,
            spec_id,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            next_action: InterpreterAction::None,
        }
    }

    /// Sets the memory limit.
    pub fn with_memory_limit(mut self, memory_limit: u64) -> Self {
        self.memory_limit = memory_limit;
        self
    }

    /// Returns the opcode at the current instruction pointer.
    #[inline]
    pub fn current_opcode(&self) -> u8 {
        self.contract
            .bytecode
            .bytes_slice()
            .get(self.pc)
            .copied()
            .unwrap_or(opcode::STOP)
    }

    /// Returns the current program counter.
    #[inline]
    pub fn program_counter(&self) -> usize {
        self.pc
    }

    /// Returns a reference to the interpreter's gas state.
    #[inline]
    pub fn gas(&self) -> &Gas {
        &self.gas
    }

    /// Returns a reference to the interpreter's stack.
    #[inline]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Executes the instruction at the current instruction pointer.
    #[inline]
    pub fn step<H: Host + ?Sized>(&mut self, instruction_table: &InstructionTable<H>, host: &mut H) {
        let opcode = self.current_opcode();
        // Code is padded with STOP so the pc never walks past a real instruction.
        self.pc += 1;
        instruction_table[opcode as usize](self, host);
    }

    /// Executes the interpreter until it returns or stops.
    pub fn run<H: Host + ?Sized>(
        &mut self,
        instruction_table: &InstructionTable<H>,
        host: &mut H,
    ) -> InterpreterAction {
        self.next_action = InterpreterAction::None;
        while self.instruction_result == InstructionResult::Continue {
            self.step(instruction_table, host);
        }
        self.take_next_action()
    }

    /// Takes the action set by the last instruction.
    ///
    /// Halts and plain `STOP`s leave no action behind, they become a `Return` with empty output.
    pub fn take_next_action(&mut self) -> InterpreterAction {
        match core::mem::take(&mut self.next_action) {
            InterpreterAction::None => InterpreterAction::Return {
                result: InterpreterResult::new(self.instruction_result, Bytes::new(), self.gas),
            },
            action => action,
        }
    }

    /// Resumes the frame after a sub call finished.
    ///
    /// Writes the return data into memory, returns unspent gas and pushes the success flag.
    pub fn insert_call_outcome(&mut self, outcome: CallOutcome) {
        self.instruction_result = InstructionResult::Continue;
        let out_offset = outcome.memory_offset.start;
        let out_len = outcome.memory_offset.len();
        let out_ins_result = outcome.instruction_result();
        let out_gas = outcome.result.gas;
        self.return_data_buffer = outcome.result.output;
        let target_len = min(out_len, self.return_data_buffer.len());

        match out_ins_result {
            return_ok!() => {
                self.gas.erase_cost(out_gas.remaining());
                self.gas.record_refund(out_gas.refunded());
                self.memory
                    .set(out_offset, &self.return_data_buffer[..target_len]);
                push!(self, U256::from(1));
            }
            return_revert!() => {
                self.gas.erase_cost(out_gas.remaining());
                self.memory
                    .set(out_offset, &self.return_data_buffer[..target_len]);
                push!(self, U256::ZERO);
            }
            InstructionResult::FatalExternalError => {
                self.instruction_result = InstructionResult::FatalExternalError;
            }
            _ => {
                push!(self, U256::ZERO);
            }
        }
    }

    /// Resumes the frame after a `CREATE` or `CREATE2` finished.
    ///
    /// Pushes the new address, or zero when the creation failed.
    pub fn insert_create_outcome(&mut self, outcome: CreateOutcome) {
        self.instruction_result = InstructionResult::Continue;
        let instruction_result = outcome.instruction_result();
        let gas = outcome.result.gas;
        let created_address = outcome.created_address();
        self.return_data_buffer = if instruction_result.is_revert() {
            outcome.result.output
        } else {
            Bytes::new()
        };

        match instruction_result {
            return_ok!() => {
                push_b256!(self, created_address.unwrap_or_default().into_word());
                self.gas.erase_cost(gas.remaining());
                self.gas.record_refund(gas.refunded());
            }
            return_revert!() => {
                push!(self, U256::ZERO);
                self.gas.erase_cost(gas.remaining());
            }
            InstructionResult::FatalExternalError => {
                self.instruction_result = InstructionResult::FatalExternalError;
            }
            _ => {
                push!(self, U256::ZERO);
            }
        }
    }

    /// Resizes memory to cover `offset..offset + len`, charging the expansion.
    ///
    /// Zero length ranges never expand memory. Returns `false` and sets the instruction result when the expansion can not be paid.
    pub fn resize_memory(&mut self, offset: usize, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        let new_size = offset.saturating_add(len);
        if new_size <= self.memory.len() {
            return true;
        }
        if new_size as u64 > self.memory_limit {
            self.instruction_result = InstructionResult::MemoryLimitOOG;
            return false;
        }
        let words = num_words(new_size);
        match self.gas.record_memory_expansion(words) {
            gas::MemoryExtensionResult::Extended => {
                self.memory.resize(words * 32);
                true
            }
            gas::MemoryExtensionResult::Same => true,
            gas::MemoryExtensionResult::OutOfGas => {
                self.instruction_result = InstructionResult::MemoryOOG;
                false
            }
        }
    }
}
