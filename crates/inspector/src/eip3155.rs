use crate::{inspectors::GasInspector, Inspector};
use context::{Context, ExecutionResult};
use database_interface::Database;
use interpreter::{
    bytecode::opcode::OpCode, CallInputs, CallOutcome, CreateInputs, CreateOutcome, Interpreter,
};
use primitives::{hex, B256, U256};
use serde::Serialize;
use std::io::Write;

/// [EIP-3155](https://eips.ethereum.org/EIPS/eip-3155) tracer [Inspector].
///
/// Writes one JSON object per executed instruction and a summary once the transaction ends.
/// Every line is flushed as soon as it is written.
pub struct TracerEip3155 {
    output: Box<dyn Write + Send>,
    gas_inspector: GasInspector,
    /// Print summary of the execution.
    print_summary: bool,
    stack: Vec<U256>,
    pc: u64,
    opcode: u8,
    gas: u64,
    refunded: i64,
    mem_size: usize,
    return_data: String,
    depth: u64,
    include_memory: bool,
    memory: Option<String>,
}

impl core::fmt::Debug for TracerEip3155 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TracerEip3155")
            .field("gas_inspector", &self.gas_inspector)
            .field("print_summary", &self.print_summary)
            .field("stack", &self.stack)
            .field("pc", &self.pc)
            .field("opcode", &self.opcode)
            .field("gas", &self.gas)
            .field("refunded", &self.refunded)
            .field("mem_size", &self.mem_size)
            .field("depth", &self.depth)
            .field("include_memory", &self.include_memory)
            .finish_non_exhaustive()
    }
}

// # Output
// The CUT MUST output a `json` object for EACH operation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output<'a> {
    // Required fields:
    /// Program counter
    pc: u64,
    /// OpCode
    op: u8,
    /// Gas left before executing this operation
    #[serde(serialize_with = "serde_hex_u64")]
    gas: u64,
    /// Gas cost of this operation
    #[serde(serialize_with = "serde_hex_u64")]
    gas_cost: u64,
    /// Array of all values on the stack
    stack: &'a [U256],
    /// Depth of the call stack
    depth: u64,
    /// Data returned by the function call
    return_data: &'a str,
    /// Amount of **global** gas refunded
    #[serde(serialize_with = "serde_hex_u64")]
    refund: u64,
    /// Size of memory array
    #[serde(serialize_with = "serde_hex_u64")]
    mem_size: u64,

    // Optional fields:
    /// Name of the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    op_name: Option<&'static str>,
    /// Description of an error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Array of all allocated values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    memory: Option<String>,
}

// # Summary and error handling
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    /// Root of the state trie after executing the transaction
    state_root: String,
    /// Return values of the function
    output: String,
    /// All gas used by the transaction
    #[serde(serialize_with = "serde_hex_u64")]
    gas_used: u64,
    /// Bool whether transaction was executed successfully
    pass: bool,
}

impl TracerEip3155 {
    /// Creates a new EIP-3155 tracer with the given output writer, by first wrapping it in a
    /// [`BufWriter`](std::io::BufWriter).
    pub fn buffered(output: impl Write + Send + 'static) -> Self {
        Self::new(Box::new(std::io::BufWriter::new(output)))
    }

    /// Creates a new EIP-3155 tracer with a stdout output.
    pub fn new_stdout() -> Self {
        Self::buffered(std::io::stdout())
    }

    /// Creates a new EIP-3155 tracer with the given output writer.
    pub fn new(output: Box<dyn Write + Send>) -> Self {
        Self {
            output,
            gas_inspector: GasInspector::new(),
            print_summary: true,
            include_memory: false,
            stack: Default::default(),
            memory: Default::default(),
            pc: 0,
            opcode: 0,
            gas: 0,
            refunded: 0,
            mem_size: 0,
            return_data: String::new(),
            depth: 0,
        }
    }

    /// Sets the writer to use for the output.
    pub fn set_writer(&mut self, writer: Box<dyn Write + Send>) {
        self.output = writer;
    }

    /// Don't include a summary at the end of the trace
    pub fn without_summary(mut self) -> Self {
        self.print_summary = false;
        self
    }

    /// Include a memory field for each step. This significantly increases processing time and output size.
    pub fn with_memory(mut self) -> Self {
        self.include_memory = true;
        self
    }

    /// Resets the tracer to its initial state of [`Self::new`].
    ///
    /// This makes the inspector ready to be used again.
    pub fn clear(&mut self) {
        let Self {
            gas_inspector,
            stack,
            pc,
            opcode,
            gas,
            refunded,
            mem_size,
            return_data,
            depth,
            ..
        } = self;
        *gas_inspector = GasInspector::new();
        stack.clear();
        *pc = 0;
        *opcode = 0;
        *gas = 0;
        *refunded = 0;
        *mem_size = 0;
        return_data.clear();
        *depth = 0;
    }

    fn print_summary(&mut self, result: &ExecutionResult) {
        if !self.print_summary {
            return;
        }
        let value = Summary {
            state_root: B256::ZERO.to_string(),
            output: result.output().cloned().unwrap_or_default().to_string(),
            gas_used: result.gas_used(),
            pass: result.is_success(),
        };
        let _ = self.write_value(&value);
    }

    fn write_value(&mut self, value: &impl Serialize) -> std::io::Result<()> {
        write_value(&mut *self.output, value)
    }
}

impl<DB: Database> Inspector<DB> for TracerEip3155 {
    fn initialize_interp(&mut self, interp: &mut Interpreter, _: &mut Context<DB>) {
        self.gas_inspector.initialize_interp(interp.gas());
    }

    fn step(&mut self, interp: &mut Interpreter, _: &mut Context<DB>) {
        self.gas_inspector.step(interp.gas());
        self.stack.clear();
        self.stack.extend_from_slice(interp.stack().data());
        self.memory = self
            .include_memory
            .then(|| hex::encode_prefixed(interp.memory.data()));
        self.pc = interp.program_counter() as u64;
        self.opcode = interp.current_opcode();
        self.mem_size = interp.memory.len();
        self.gas = interp.gas().remaining();
        self.refunded = interp.gas().refunded();
        self.return_data = hex::encode_prefixed(&interp.return_data_buffer);
    }

    fn step_end(&mut self, interp: &mut Interpreter, _: &mut Context<DB>) {
        self.gas_inspector.step_end(interp.gas());

        let value = Output {
            pc: self.pc,
            op: self.opcode,
            gas: self.gas,
            gas_cost: self.gas_inspector.last_gas_cost(),
            stack: &self.stack,
            depth: self.depth,
            return_data: &self.return_data,
            refund: self.refunded.max(0) as u64,
            mem_size: self.mem_size as u64,
            op_name: OpCode::new(self.opcode).map(|op| op.as_str()),
            error: interp
                .instruction_result
                .is_error()
                .then(|| format!("{:?}", interp.instruction_result)),
            memory: self.memory.take(),
        };
        let _ = write_value(&mut *self.output, &value);
    }

    fn call(&mut self, _: &mut Context<DB>, _: &mut CallInputs) -> Option<CallOutcome> {
        self.depth += 1;
        None
    }

    fn call_end(&mut self, _: &mut Context<DB>, _: &CallInputs, outcome: &mut CallOutcome) {
        self.gas_inspector.frame_end(&outcome.result);
        self.depth = self.depth.saturating_sub(1);
    }

    fn create(&mut self, _: &mut Context<DB>, _: &mut CreateInputs) -> Option<CreateOutcome> {
        self.depth += 1;
        None
    }

    fn create_end(&mut self, _: &mut Context<DB>, _: &CreateInputs, outcome: &mut CreateOutcome) {
        self.gas_inspector.frame_end(&outcome.result);
        self.depth = self.depth.saturating_sub(1);
    }

    fn transaction_end(&mut self, _: &mut Context<DB>, result: &ExecutionResult) {
        self.print_summary(result);
        self.clear();
    }
}

/// Writes `value` as one JSON line and flushes it.
fn write_value(output: &mut dyn Write, value: &impl Serialize) -> std::io::Result<()> {
    serde_json::to_writer(&mut *output, value)?;
    output.write_all(b"\n")?;
    output.flush()
}

fn serde_hex_u64<S: serde::Serializer>(n: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:#x}", *n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::inspect_bytecode;
    use primitives::bytes;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn lines(&self) -> Vec<serde_json::Value> {
            let data = self.0.lock().unwrap();
            std::str::from_utf8(&data)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    #[test]
    fn one_line_per_step_and_a_summary() {
        let buffer = SharedBuffer::default();
        let tracer = TracerEip3155::new(Box::new(buffer.clone()));

        // PUSH1 2 PUSH1 3 ADD STOP
        inspect_bytecode(bytes!("600260030100"), 1000, tracer);

        let lines = buffer.lines();
        assert_eq!(lines.len(), 5);

        let first = &lines[0];
        assert_eq!(first["pc"], 0);
        assert_eq!(first["op"], 0x60);
        assert_eq!(first["opName"], "PUSH1");
        assert_eq!(first["gas"], "0x3e8");
        assert_eq!(first["gasCost"], "0x3");
        assert_eq!(first["depth"], 1);
        assert_eq!(first["stack"], serde_json::json!([]));
        assert_eq!(first["returnData"], "0x");

        let add = &lines[2];
        assert_eq!(add["opName"], "ADD");
        assert_eq!(add["stack"].as_array().unwrap().len(), 2);

        let summary = lines.last().unwrap();
        let keys: Vec<_> = summary.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["stateRoot", "output", "gasUsed", "pass"]);
        assert_eq!(summary["gasUsed"], "0x9");
        assert_eq!(summary["pass"], true);
        assert_eq!(summary["output"], "0x");
        assert_eq!(summary["stateRoot"], B256::ZERO.to_string());
    }

    #[test]
    fn failing_step_reports_error() {
        let buffer = SharedBuffer::default();
        let tracer = TracerEip3155::new(Box::new(buffer.clone())).without_summary();

        // ADD on an empty stack
        inspect_bytecode(bytes!("01"), 1000, tracer);

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["error"], "StackUnderflow");
    }
}
