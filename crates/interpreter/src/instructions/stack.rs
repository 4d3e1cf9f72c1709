use crate::{gas, Host, Interpreter};
use core::cmp::min;
use primitives::U256;

pub fn pop<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::BASE);
    if let Err(result) = interpreter.stack.pop() {
        interpreter.instruction_result = result;
    }
}

/// EIP-3855: PUSH0 instruction
///
/// Introduce a new instruction which pushes the constant value 0 onto the stack.
pub fn push0<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    check!(interpreter, SHANGHAI);
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::ZERO);
}

/// Pushes the `N` immediate bytes following the opcode. Bytes past the end of the code
/// read as zero.
pub fn push<const N: usize, H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    let mut immediate = [0u8; N];
    let code = interpreter.contract.bytecode.bytes_slice();
    let rest = code.get(interpreter.pc..).unwrap_or_default();
    let available = min(N, rest.len());
    immediate[..available].copy_from_slice(&rest[..available]);

    if let Err(result) = interpreter.stack.push_slice(&immediate) {
        interpreter.instruction_result = result;
        return;
    }
    interpreter.pc += N;
}

pub fn dup<const N: usize, H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    if let Err(result) = interpreter.stack.dup(N) {
        interpreter.instruction_result = result;
    }
}

pub fn swap<const N: usize, H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    if let Err(result) = interpreter.stack.swap(N) {
        interpreter.instruction_result = result;
    }
}

#[cfg(test)]
mod tests {
    use crate::{make_instruction_table, Contract, DummyHost, InstructionResult, Interpreter};
    use bytecode::Bytecode;
    use primitives::{bytes, hardfork::SpecId, Bytes, U256};

    fn run(code: Bytes) -> Interpreter {
        let contract = Contract {
            bytecode: Bytecode::new_raw(code),
            ..Default::default()
        };
        let mut interpreter = Interpreter::new(contract, 100_000, false, SpecId::CANCUN);
        let table = make_instruction_table::<DummyHost>();
        interpreter.run(&table, &mut DummyHost::default());
        interpreter
    }

    #[test]
    fn truncated_push_reads_zeros() {
        // PUSH3 0x0102, the last immediate byte is missing
        let interpreter = run(bytes!("620102"));
        assert_eq!(interpreter.instruction_result, InstructionResult::Stop);
        assert_eq!(interpreter.stack.data(), &[U256::from(0x010200)]);
    }

    #[test]
    fn dup_and_swap() {
        // PUSH1 1 PUSH1 2 DUP2 SWAP2 POP
        let interpreter = run(bytes!("60016002819150"));
        assert_eq!(interpreter.stack.data(), &[U256::from(1), U256::from(2)]);
        assert_eq!(interpreter.gas.spent(), 3 * 4 + 2);
    }

    #[test]
    fn dup_underflow() {
        let interpreter = run(bytes!("600182"));
        assert_eq!(interpreter.instruction_result, InstructionResult::StackUnderflow);
    }
}
