use crate::{gas, Host, InstructionResult, Interpreter, InterpreterAction, InterpreterResult};
use primitives::{Bytes, U256};

pub fn jump<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::MID);
    let target = match interpreter.stack.pop() {
        Ok(target) => target,
        Err(result) => {
            interpreter.instruction_result = result;
            return;
        }
    };
    jump_inner(interpreter, target);
}

pub fn jumpi<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::HIGH);
    popn!([target, cond], interpreter);
    if !cond.is_zero() {
        jump_inner(interpreter, target);
    }
}

#[inline]
fn jump_inner(interpreter: &mut Interpreter, target: U256) {
    let target = as_usize_or_fail!(interpreter, target, InstructionResult::InvalidJump);
    if !interpreter.contract.is_valid_jump(target) {
        interpreter.instruction_result = InstructionResult::InvalidJump;
        return;
    }
    interpreter.pc = target;
}

pub fn jumpdest<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::JUMPDEST);
}

pub fn pc<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::BASE);
    // - 1 because we have already advanced the instruction pointer in `Interpreter::step`
    push!(interpreter, U256::from(interpreter.pc - 1));
}

#[inline]
fn return_inner(interpreter: &mut Interpreter, instruction_result: InstructionResult) {
    popn!([offset, len], interpreter);
    let len = as_usize_or_fail!(interpreter, len);
    // important: offset must be ignored if len is zeros
    let mut output = Bytes::default();
    if len != 0 {
        let offset = as_usize_or_fail!(interpreter, offset);
        resize_memory!(interpreter, offset, len);
        output = interpreter.memory.slice(offset, len).to_vec().into()
    }
    interpreter.instruction_result = instruction_result;
    interpreter.next_action = InterpreterAction::Return {
        result: InterpreterResult::new(instruction_result, output, interpreter.gas),
    };
}

pub fn ret<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    return_inner(interpreter, InstructionResult::Return);
}

/// EIP-140: REVERT instruction
pub fn revert<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    check!(interpreter, BYZANTIUM);
    return_inner(interpreter, InstructionResult::Revert);
}

/// Stop opcode. This opcode halts the execution.
pub fn stop<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    interpreter.instruction_result = InstructionResult::Stop;
}

/// Invalid opcode. This opcode halts the execution.
pub fn invalid<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    interpreter.instruction_result = InstructionResult::InvalidFEOpcode;
}

/// Unknown opcode. This opcode halts the execution.
pub fn unknown<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    interpreter.instruction_result = InstructionResult::OpcodeNotFound;
}

#[cfg(test)]
mod tests {
    use crate::{
        make_instruction_table, Contract, DummyHost, InstructionResult, Interpreter,
        InterpreterAction,
    };
    use bytecode::Bytecode;
    use primitives::{bytes, hardfork::SpecId, Bytes, U256};

    fn run_with_action(code: Bytes, spec_id: SpecId) -> (Interpreter, InterpreterAction) {
        let contract = Contract {
            bytecode: Bytecode::new_raw(code),
            ..Default::default()
        };
        let mut interpreter = Interpreter::new(contract, 100_000, false, spec_id);
        let table = make_instruction_table::<DummyHost>();
        let action = interpreter.run(&table, &mut DummyHost::default());
        (interpreter, action)
    }

    fn run(code: Bytes, spec_id: SpecId) -> Interpreter {
        run_with_action(code, spec_id).0
    }

    #[test]
    fn jumpi_falls_through_on_zero() {
        // PUSH1 0 PUSH1 0xff JUMPI PC
        let interpreter = run(bytes!("600060ff5758"), SpecId::CANCUN);
        assert_eq!(interpreter.instruction_result, InstructionResult::Stop);
        assert_eq!(interpreter.stack.data(), &[U256::from(5)]);
        assert_eq!(interpreter.gas.spent(), 3 + 3 + 10 + 2);
    }

    #[test]
    fn jumpi_taken() {
        // PUSH1 1 PUSH1 7 JUMPI INVALID INVALID JUMPDEST
        let interpreter = run(bytes!("6001600757fefe5b"), SpecId::CANCUN);
        assert_eq!(interpreter.instruction_result, InstructionResult::Stop);
    }

    #[test]
    fn invalid_and_revert_before_byzantium() {
        let interpreter = run(bytes!("fe"), SpecId::CANCUN);
        assert_eq!(interpreter.instruction_result, InstructionResult::InvalidFEOpcode);

        let interpreter = run(bytes!("60006000fd"), SpecId::SPURIOUS_DRAGON);
        assert_eq!(interpreter.instruction_result, InstructionResult::NotActivated);
    }

    #[test]
    fn return_ignores_offset_when_empty() {
        // PUSH1 0 PUSH32 0xff..ff RETURN
        let mut code = vec![0x60, 0x00, 0x7f];
        code.extend([0xff; 32]);
        code.push(0xf3);
        let (interpreter, action) = run_with_action(code.into(), SpecId::CANCUN);
        assert_eq!(interpreter.instruction_result, InstructionResult::Return);
        let result = action.into_result_return().unwrap();
        assert!(result.output.is_empty());
        assert!(interpreter.memory.is_empty());
    }
}
