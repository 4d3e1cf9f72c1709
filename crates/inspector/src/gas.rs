//! Gas bookkeeping shared by inspectors that report per-instruction costs.
use interpreter::{Gas, InterpreterResult};

/// Follows the gas left in the running frame and what the last instruction cost.
///
/// It only reads the interpreter, so driving it never changes a result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasInspector {
    remaining: u64,
    last_cost: u64,
}

impl GasInspector {
    /// Starts with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gas left after the last recorded instruction.
    #[inline]
    pub fn gas_remaining(&self) -> u64 {
        self.remaining
    }

    /// Cost of the last recorded instruction, memory expansion included.
    #[inline]
    pub fn last_gas_cost(&self) -> u64 {
        self.last_cost
    }

    /// A frame starts with its whole gas limit.
    #[inline]
    pub fn initialize_interp(&mut self, gas: &Gas) {
        self.remaining = gas.limit();
        self.last_cost = 0;
    }

    /// Before an instruction.
    #[inline]
    pub fn step(&mut self, gas: &Gas) {
        self.remaining = gas.remaining();
    }

    /// After an instruction: the difference is its cost.
    #[inline]
    pub fn step_end(&mut self, gas: &Gas) {
        let remaining = gas.remaining();
        self.last_cost = self.remaining.saturating_sub(remaining);
        self.remaining = remaining;
    }

    /// A frame ended. Frames that halted keep no gas.
    #[inline]
    pub fn frame_end(&mut self, result: &InterpreterResult) {
        self.remaining = if result.result.is_error() {
            0
        } else {
            result.gas.remaining()
        };
    }
}
