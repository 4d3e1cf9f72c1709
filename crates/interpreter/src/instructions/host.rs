use super::utility::{IntoAddress, IntoU256};
use crate::{gas, Host, InstructionResult, Interpreter};
use core::cmp::min;
use primitives::{hardfork::SpecId::*, Log, LogData, B256, BLOCK_HASH_HISTORY, U256};
use std::vec::Vec;

/// Halts the frame with `FatalExternalError` when the host could not serve a state read.
macro_rules! load_or_fatal {
    ($interpreter:expr, $load:expr) => {
        match $load {
            Some(load) => load,
            None => {
                $interpreter.instruction_result = InstructionResult::FatalExternalError;
                return;
            }
        }
    };
}

pub fn balance<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    popn_top!([], top, interpreter);
    let address = top.into_address();
    let balance = load_or_fatal!(interpreter, host.balance(address));
    gas!(
        interpreter,
        gas::balance_cost(interpreter.spec_id, balance.is_cold)
    );
    *top = balance.data;
}

/// EIP-1884: Repricing for trie-size-dependent opcodes
pub fn selfbalance<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    check!(interpreter, ISTANBUL);
    gas!(interpreter, gas::LOW);
    let balance = load_or_fatal!(
        interpreter,
        host.balance(interpreter.contract.target_address)
    );
    push!(interpreter, balance.data);
}

pub fn extcodesize<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    popn_top!([], top, interpreter);
    let address = top.into_address();
    let code = load_or_fatal!(interpreter, host.code(address));
    gas!(
        interpreter,
        gas::extcodesize_cost(interpreter.spec_id, code.is_cold)
    );
    *top = U256::from(code.data.len());
}

/// EIP-1052: EXTCODEHASH opcode
pub fn extcodehash<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    check!(interpreter, CONSTANTINOPLE);
    popn_top!([], top, interpreter);
    let address = top.into_address();
    let code_hash = load_or_fatal!(interpreter, host.code_hash(address));
    gas!(
        interpreter,
        gas::extcodehash_cost(interpreter.spec_id, code_hash.is_cold)
    );
    *top = code_hash.data.into_u256();
}

pub fn extcodecopy<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    popn!([address, memory_offset, code_offset, len], interpreter);
    let address = address.into_address();
    let code = load_or_fatal!(interpreter, host.code(address));

    let len = as_usize_or_fail!(interpreter, len);
    gas_or_fail!(
        interpreter,
        gas::extcodecopy_cost(interpreter.spec_id, len, code.is_cold)
    );
    if len == 0 {
        return;
    }
    let memory_offset = as_usize_or_fail!(interpreter, memory_offset);
    let code_offset = min(as_usize_saturated!(code_offset), code.data.len());
    resize_memory!(interpreter, memory_offset, len);

    // Note: this can't panic because we resized memory to fit.
    interpreter
        .memory
        .set_data(memory_offset, code_offset, len, &code.data);
}

/// Hash of one of the 256 most recent blocks, zero for anything else.
pub fn blockhash<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    gas!(interpreter, gas::BLOCKHASH);
    popn_top!([], number, interpreter);

    let requested = as_u64_saturated!(number);
    let current = host.block_number();
    let in_window = requested < current && current - requested <= BLOCK_HASH_HISTORY;
    if !in_window {
        *number = U256::ZERO;
        return;
    }
    let hash = load_or_fatal!(interpreter, host.block_hash(requested));
    *number = hash.into_u256();
}

pub fn sload<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    popn_top!([], index, interpreter);
    let value = load_or_fatal!(
        interpreter,
        host.sload(interpreter.contract.target_address, *index)
    );
    gas!(
        interpreter,
        gas::sload_cost(interpreter.spec_id, value.is_cold)
    );
    *index = value.data;
}

pub fn sstore<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    require_non_staticcall!(interpreter);
    popn!([index, value], interpreter);

    // EIP-2200: Structured Definitions for Net Gas Metering
    // If gasleft is less than or equal to gas stipend, fail the current call frame with ‘out of gas’ exception.
    if interpreter.spec_id.is_enabled_in(ISTANBUL) && interpreter.gas.remaining() <= gas::CALL_STIPEND
    {
        interpreter.instruction_result = InstructionResult::ReentrancySentryOOG;
        return;
    }

    let state_load = load_or_fatal!(
        interpreter,
        host.sstore(interpreter.contract.target_address, index, value)
    );
    gas!(
        interpreter,
        gas::sstore_cost(interpreter.spec_id, &state_load.data, state_load.is_cold)
    );
    interpreter
        .gas
        .record_refund(gas::sstore_refund(interpreter.spec_id, &state_load.data));
}

/// EIP-1153: Transient storage opcodes
/// Store value to transient storage
pub fn tstore<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    check!(interpreter, CANCUN);
    require_non_staticcall!(interpreter);
    gas!(interpreter, gas::WARM_STORAGE_READ_COST);

    popn!([index, value], interpreter);

    host.tstore(interpreter.contract.target_address, index, value);
}

/// EIP-1153: Transient storage opcodes
/// Load value from transient storage
pub fn tload<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    check!(interpreter, CANCUN);
    gas!(interpreter, gas::WARM_STORAGE_READ_COST);

    popn_top!([], index, interpreter);

    *index = host.tload(interpreter.contract.target_address, *index);
}

pub fn log<const N: usize, H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    require_non_staticcall!(interpreter);

    popn!([offset, len], interpreter);
    let len = as_usize_or_fail!(interpreter, len);
    gas_or_fail!(interpreter, gas::log_cost(N as u8, len as u64));
    let data = if len == 0 {
        primitives::Bytes::new()
    } else {
        let offset = as_usize_or_fail!(interpreter, offset);
        resize_memory!(interpreter, offset, len);
        primitives::Bytes::copy_from_slice(interpreter.memory.slice(offset, len))
    };

    let Some(topics) = interpreter.stack.popn::<N>() else {
        interpreter.instruction_result = InstructionResult::StackUnderflow;
        return;
    };
    let topics: Vec<B256> = topics.into_iter().map(B256::from).collect();

    host.log(Log {
        address: interpreter.contract.target_address,
        data: LogData::new_unchecked(topics, data),
    });
}

pub fn selfdestruct<H: Host + ?Sized>(interpreter: &mut Interpreter, host: &mut H) {
    require_non_staticcall!(interpreter);
    popn!([target], interpreter);
    let target = target.into_address();

    let res = load_or_fatal!(
        interpreter,
        host.selfdestruct(interpreter.contract.target_address, target)
    );

    // EIP-3529: Reduction in refunds
    if !interpreter.spec_id.is_enabled_in(LONDON) && !res.data.previously_destroyed {
        interpreter.gas.record_refund(gas::SELFDESTRUCT)
    }
    gas!(interpreter, gas::selfdestruct_cost(interpreter.spec_id, res));

    interpreter.instruction_result = InstructionResult::SelfDestruct;
}

#[cfg(test)]
mod tests {
    use crate::{make_instruction_table, Contract, DummyHost, InstructionResult, Interpreter};
    use bytecode::Bytecode;
    use primitives::{b256, bytes, hardfork::SpecId, keccak256, Bytes, U256};

    fn run(code: Bytes, spec_id: SpecId, host: &mut DummyHost) -> Interpreter {
        let contract = Contract {
            bytecode: Bytecode::new_raw(code),
            ..Default::default()
        };
        let mut interpreter = Interpreter::new(contract, 100_000, false, spec_id);
        let table = make_instruction_table::<DummyHost>();
        interpreter.run(&table, host);
        interpreter
    }

    #[test]
    fn sload_charges_cold_then_warm() {
        // PUSH1 1 SLOAD PUSH1 1 SLOAD
        let interpreter = run(bytes!("600154600154"), SpecId::CANCUN, &mut DummyHost::default());
        assert_eq!(interpreter.gas.spent(), 3 + 2100 + 3 + 100);
    }

    #[test]
    fn sstore_then_sload_round_trip() {
        let mut host = DummyHost::default();
        // PUSH1 0x2a PUSH1 1 SSTORE PUSH1 1 SLOAD
        let interpreter = run(bytes!("602a60015560015400"), SpecId::CANCUN, &mut host);
        assert_eq!(interpreter.instruction_result, InstructionResult::Stop);
        assert_eq!(interpreter.stack.data(), &[U256::from(0x2a)]);
        assert_eq!(host.storage.get(&U256::from(1)), Some(&U256::from(0x2a)));
    }

    #[test]
    fn sstore_needs_more_than_stipend() {
        let contract = Contract {
            bytecode: Bytecode::new_raw(bytes!("6001600155")),
            ..Default::default()
        };
        let mut interpreter = Interpreter::new(contract, 2306, false, SpecId::CANCUN);
        let table = make_instruction_table::<DummyHost>();
        interpreter.run(&table, &mut DummyHost::default());
        assert_eq!(
            interpreter.instruction_result,
            InstructionResult::ReentrancySentryOOG
        );
    }

    #[test]
    fn transient_storage() {
        let mut host = DummyHost::default();
        // PUSH1 7 PUSH1 1 TSTORE PUSH1 1 TLOAD
        let interpreter = run(bytes!("600760015d60015c"), SpecId::CANCUN, &mut host);
        assert_eq!(interpreter.stack.data(), &[U256::from(7)]);
        assert_eq!(interpreter.gas.spent(), 3 * 3 + 100 * 2);

        let interpreter = run(bytes!("60015c"), SpecId::SHANGHAI, &mut host);
        assert_eq!(interpreter.instruction_result, InstructionResult::NotActivated);
    }

    #[test]
    fn log_topics_and_data() {
        let mut host = DummyHost::default();
        // PUSH1 0xbb PUSH1 0xaa PUSH1 0 MSTORE8 PUSH1 1 PUSH1 0 LOG1
        let interpreter = run(bytes!("60bb60aa60005360016000a1"), SpecId::CANCUN, &mut host);
        assert_eq!(interpreter.instruction_result, InstructionResult::Stop);
        assert_eq!(host.log.len(), 1);
        let log = &host.log[0];
        assert_eq!(
            log.topics(),
            &[b256!("00000000000000000000000000000000000000000000000000000000000000bb")]
        );
        assert_eq!(log.data.data, bytes!("aa"));
    }

    #[test]
    fn blockhash_window() {
        let mut host = DummyHost {
            block_number: 300,
            ..Default::default()
        };
        // PUSH1 44 BLOCKHASH, exactly 256 blocks back
        let interpreter = run(bytes!("602c40"), SpecId::CANCUN, &mut host);
        assert_eq!(
            interpreter.stack.data(),
            &[U256::from_be_bytes(keccak256(44u64.to_be_bytes()).0)]
        );
        // PUSH1 43 BLOCKHASH
        let interpreter = run(bytes!("602b40"), SpecId::CANCUN, &mut host);
        assert_eq!(interpreter.stack.data(), &[U256::ZERO]);
        // PUSH2 300 BLOCKHASH, the current block has no hash
        let interpreter = run(bytes!("61012c40"), SpecId::CANCUN, &mut host);
        assert_eq!(interpreter.stack.data(), &[U256::ZERO]);
        assert_eq!(interpreter.gas.spent(), 3 + 20);
    }

    #[test]
    fn selfdestruct_halts() {
        let interpreter = run(bytes!("6000ff"), SpecId::CANCUN, &mut DummyHost::default());
        assert_eq!(interpreter.instruction_result, InstructionResult::SelfDestruct);
    }
}
