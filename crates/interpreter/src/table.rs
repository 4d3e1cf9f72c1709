//! Maps opcode bytes to instruction functions.

use crate::{
    instructions::{
        arithmetic, bitwise, contract, control, host, host_env, memory, stack, system,
    },
    Host, Interpreter,
};
use bytecode::opcode::*;

/// EVM opcode function signature.
pub type Instruction<H> = fn(&mut Interpreter, &mut H);

/// Instruction table is list of instruction function pointers mapped to 256 EVM opcodes.
pub type InstructionTable<H> = [Instruction<H>; 256];

/// Makes an instruction table for the given host. Bytes that are not opcodes halt with
/// `OpcodeNotFound`; hardfork activation is checked by each instruction.
#[inline]
pub const fn make_instruction_table<H: Host + ?Sized>() -> InstructionTable<H> {
    let mut table: InstructionTable<H> = [control::unknown; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = instruction::<H>(i as u8);
        i += 1;
    }
    table
}

/// Returns the instruction function for the given opcode.
pub const fn instruction<H: Host + ?Sized>(opcode: u8) -> Instruction<H> {
    match opcode {
        STOP => control::stop,
        ADD => arithmetic::add,
        MUL => arithmetic::mul,
        SUB => arithmetic::sub,
        DIV => arithmetic::div,
        SDIV => arithmetic::sdiv,
        MOD => arithmetic::rem,
        SMOD => arithmetic::smod,
        ADDMOD => arithmetic::addmod,
        MULMOD => arithmetic::mulmod,
        EXP => arithmetic::exp,
        SIGNEXTEND => arithmetic::signextend,

        LT => bitwise::lt,
        GT => bitwise::gt,
        SLT => bitwise::slt,
        SGT => bitwise::sgt,
        EQ => bitwise::eq,
        ISZERO => bitwise::iszero,
        AND => bitwise::bitand,
        OR => bitwise::bitor,
        XOR => bitwise::bitxor,
        NOT => bitwise::not,
        BYTE => bitwise::byte,
        SHL => bitwise::shl,
        SHR => bitwise::shr,
        SAR => bitwise::sar,

        KECCAK256 => system::keccak256,

        ADDRESS => system::address,
        BALANCE => host::balance,
        ORIGIN => host_env::origin,
        CALLER => system::caller,
        CALLVALUE => system::callvalue,
        CALLDATALOAD => system::calldataload,
        CALLDATASIZE => system::calldatasize,
        CALLDATACOPY => system::calldatacopy,
        CODESIZE => system::codesize,
        CODECOPY => system::codecopy,

        GASPRICE => host_env::gasprice,
        EXTCODESIZE => host::extcodesize,
        EXTCODECOPY => host::extcodecopy,
        RETURNDATASIZE => system::returndatasize,
        RETURNDATACOPY => system::returndatacopy,
        EXTCODEHASH => host::extcodehash,
        BLOCKHASH => host::blockhash,
        COINBASE => host_env::coinbase,
        TIMESTAMP => host_env::timestamp,
        NUMBER => host_env::block_number,
        DIFFICULTY => host_env::difficulty,
        GASLIMIT => host_env::gaslimit,
        CHAINID => host_env::chainid,
        SELFBALANCE => host::selfbalance,
        BASEFEE => host_env::basefee,
        BLOBHASH => host_env::blob_hash,
        BLOBBASEFEE => host_env::blob_basefee,

        POP => stack::pop,
        MLOAD => memory::mload,
        MSTORE => memory::mstore,
        MSTORE8 => memory::mstore8,
        SLOAD => host::sload,
        SSTORE => host::sstore,
        JUMP => control::jump,
        JUMPI => control::jumpi,
        PC => control::pc,
        MSIZE => memory::msize,
        GAS => system::gas,
        JUMPDEST => control::jumpdest,
        TLOAD => host::tload,
        TSTORE => host::tstore,
        MCOPY => memory::mcopy,

        PUSH0 => stack::push0,
        PUSH1 => stack::push::<1, H>,
        PUSH2 => stack::push::<2, H>,
        PUSH3 => stack::push::<3, H>,
        PUSH4 => stack::push::<4, H>,
        PUSH5 => stack::push::<5, H>,
        PUSH6 => stack::push::<6, H>,
        PUSH7 => stack::push::<7, H>,
        PUSH8 => stack::push::<8, H>,
        PUSH9 => stack::push::<9, H>,
        PUSH10 => stack::push::<10, H>,
        PUSH11 => stack::push::<11, H>,
        PUSH12 => stack::push::<12, H>,
        PUSH13 => stack::push::<13, H>,
        PUSH14 => stack::push::<14, H>,
        PUSH15 => stack::push::<15, H>,
        PUSH16 => stack::push::<16, H>,
        PUSH17 => stack::push::<17, H>,
        PUSH18 => stack::push::<18, H>,
        PUSH19 => stack::push::<19, H>,
        PUSH20 => stack::push::<20, H>,
        PUSH21 => stack::push::<21, H>,
        PUSH22 => stack::push::<22, H>,
        PUSH23 => stack::push::<23, H>,
        PUSH24 => stack::push::<24, H>,
        PUSH25 => stack::push::<25, H>,
        PUSH26 => stack::push::<26, H>,
        PUSH27 => stack::push::<27, H>,
        PUSH28 => stack::push::<28, H>,
        PUSH29 => stack::push::<29, H>,
        PUSH30 => stack::push::<30, H>,
        PUSH31 => stack::push::<31, H>,
        PUSH32 => stack::push::<32, H>,

        DUP1 => stack::dup::<1, H>,
        DUP2 => stack::dup::<2, H>,
        DUP3 => stack::dup::<3, H>,
        DUP4 => stack::dup::<4, H>,
        DUP5 => stack::dup::<5, H>,
        DUP6 => stack::dup::<6, H>,
        DUP7 => stack::dup::<7, H>,
        DUP8 => stack::dup::<8, H>,
        DUP9 => stack::dup::<9, H>,
        DUP10 => stack::dup::<10, H>,
        DUP11 => stack::dup::<11, H>,
        DUP12 => stack::dup::<12, H>,
        DUP13 => stack::dup::<13, H>,
        DUP14 => stack::dup::<14, H>,
        DUP15 => stack::dup::<15, H>,
        DUP16 => stack::dup::<16, H>,

        SWAP1 => stack::swap::<1, H>,
        SWAP2 => stack::swap::<2, H>,
        SWAP3 => stack::swap::<3, H>,
        SWAP4 => stack::swap::<4, H>,
        SWAP5 => stack::swap::<5, H>,
        SWAP6 => stack::swap::<6, H>,
        SWAP7 => stack::swap::<7, H>,
        SWAP8 => stack::swap::<8, H>,
        SWAP9 => stack::swap::<9, H>,
        SWAP10 => stack::swap::<10, H>,
        SWAP11 => stack::swap::<11, H>,
        SWAP12 => stack::swap::<12, H>,
        SWAP13 => stack::swap::<13, H>,
        SWAP14 => stack::swap::<14, H>,
        SWAP15 => stack::swap::<15, H>,
        SWAP16 => stack::swap::<16, H>,

        LOG0 => host::log::<0, H>,
        LOG1 => host::log::<1, H>,
        LOG2 => host::log::<2, H>,
        LOG3 => host::log::<3, H>,
        LOG4 => host::log::<4, H>,

        CREATE => contract::create::<false, H>,
        CALL => contract::call,
        CALLCODE => contract::call_code,
        RETURN => control::ret,
        DELEGATECALL => contract::delegate_call,
        CREATE2 => contract::create::<true, H>,
        STATICCALL => contract::static_call,
        REVERT => control::revert,
        INVALID => control::invalid,
        SELFDESTRUCT => host::selfdestruct,
        _ => control::unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Contract, DummyHost, InstructionResult};
    use bytecode::{Bytecode, OPCODE_INFO};
    use primitives::{hardfork::SpecId, Bytes};

    #[test]
    fn only_unassigned_bytes_are_unknown() {
        let table = make_instruction_table::<DummyHost>();
        for (byte, info) in OPCODE_INFO.iter().enumerate() {
            let contract = Contract {
                bytecode: Bytecode::new_raw(Bytes::from(vec![byte as u8])),
                ..Default::default()
            };
            let mut interpreter = Interpreter::new(contract, 1_000_000, false, SpecId::CANCUN);
            interpreter.run(&table, &mut DummyHost::default());
            let not_found = interpreter.instruction_result == InstructionResult::OpcodeNotFound;
            assert_eq!(not_found, info.is_none(), "opcode {byte:#04x}");
        }
    }
}
