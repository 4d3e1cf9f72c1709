use super::i256::{i256_cmp, i256_sign, two_compl, Sign};
use crate::{gas, Host, Interpreter};
use core::cmp::Ordering;
use primitives::U256;

pub fn lt<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = U256::from(op1 < *op2);
}

pub fn gt<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = U256::from(op1 > *op2);
}

pub fn slt<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = U256::from(i256_cmp(&op1, op2) == Ordering::Less);
}

pub fn sgt<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = U256::from(i256_cmp(&op1, op2) == Ordering::Greater);
}

pub fn eq<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = U256::from(op1 == *op2);
}

pub fn iszero<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([], op1, interpreter);
    *op1 = U256::from(op1.is_zero());
}

pub fn bitand<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1 & *op2;
}

pub fn bitor<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1 | *op2;
}

pub fn bitxor<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1 ^ *op2;
}

pub fn not<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([], op1, interpreter);
    *op1 = !*op1;
}

/// Byte `op1` of `op2`, counted from the most significant byte.
pub fn byte<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    let o1 = as_usize_saturated!(op1);
    *op2 = if o1 < 32 {
        // `31 - o1` because `byte` counts from the least significant byte
        U256::from(op2.byte(31 - o1))
    } else {
        U256::ZERO
    };
}

/// EIP-145: Bitwise shifting instructions in EVM
pub fn shl<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    check!(interpreter, CONSTANTINOPLE);
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    let shift = as_usize_saturated!(op1);
    *op2 = if shift < 256 { *op2 << shift } else { U256::ZERO }
}

/// EIP-145: Bitwise shifting instructions in EVM
pub fn shr<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    check!(interpreter, CONSTANTINOPLE);
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    let shift = as_usize_saturated!(op1);
    *op2 = if shift < 256 { *op2 >> shift } else { U256::ZERO }
}

/// EIP-145: Bitwise shifting instructions in EVM
pub fn sar<H: Host + ?Sized>(interpreter: &mut Interpreter, _host: &mut H) {
    check!(interpreter, CONSTANTINOPLE);
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);

    let shift = as_usize_saturated!(op1);
    let value_sign = i256_sign::<true>(op2);

    *op2 = if op2.is_zero() || shift >= 256 {
        match value_sign {
            // value is 0 or >=1, pushing 0
            Sign::Plus | Sign::Zero => U256::ZERO,
            // value is <0, pushing -1
            Sign::Minus => U256::MAX,
        }
    } else {
        const ONE: U256 = U256::from_limbs([1, 0, 0, 0]);
        match value_sign {
            Sign::Plus | Sign::Zero => op2.wrapping_shr(shift),
            Sign::Minus => two_compl(op2.wrapping_sub(ONE).wrapping_shr(shift).wrapping_add(ONE)),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{make_instruction_table, Contract, DummyHost, InstructionResult, Interpreter};
    use bytecode::{opcode::*, Bytecode};
    use primitives::{hardfork::SpecId, Bytes, U256};
    use rstest::rstest;

    fn run_top(op: u8, value: U256, top: U256, spec_id: SpecId) -> (InstructionResult, U256) {
        let mut code = vec![PUSH32];
        code.extend_from_slice(&value.to_be_bytes::<32>());
        code.push(PUSH32);
        code.extend_from_slice(&top.to_be_bytes::<32>());
        code.push(op);
        let contract = Contract {
            bytecode: Bytecode::new_raw(Bytes::from(code)),
            ..Default::default()
        };
        let mut interpreter = Interpreter::new(contract, 100_000, false, spec_id);
        let table = make_instruction_table::<DummyHost>();
        interpreter.run(&table, &mut DummyHost::default());
        (
            interpreter.instruction_result,
            interpreter.stack.peek(0).unwrap_or_default(),
        )
    }

    #[rstest]
    #[case(LT, U256::from(2), U256::from(1), U256::from(1))]
    #[case(GT, U256::from(2), U256::from(1), U256::ZERO)]
    #[case(SLT, U256::from(1), U256::MAX, U256::from(1))]
    #[case(SGT, U256::from(1), U256::MAX, U256::ZERO)]
    #[case(EQ, U256::from(7), U256::from(7), U256::from(1))]
    #[case(BYTE, U256::from(0xabcd), U256::from(30), U256::from(0xab))]
    #[case(BYTE, U256::from(0xabcd), U256::from(32), U256::ZERO)]
    #[case(SHL, U256::from(1), U256::from(255), U256::from(1) << 255)]
    #[case(SHL, U256::from(1), U256::from(256), U256::ZERO)]
    #[case(SHR, U256::from(1) << 255, U256::from(255), U256::from(1))]
    #[case(SAR, U256::MAX - U256::from(15), U256::from(4), U256::MAX)]
    #[case(SAR, U256::from(1) << 255, U256::from(300), U256::MAX)]
    #[case(SAR, U256::from(0x100), U256::from(4), U256::from(0x10))]
    fn compare_and_shift(
        #[case] op: u8,
        #[case] value: U256,
        #[case] top: U256,
        #[case] expected: U256,
    ) {
        let (result, out) = run_top(op, value, top, SpecId::CANCUN);
        assert_eq!(result, InstructionResult::Stop);
        assert_eq!(out, expected);
    }

    #[test]
    fn shifts_need_constantinople() {
        let (result, _) = run_top(SHL, U256::from(1), U256::from(1), SpecId::BYZANTIUM);
        assert_eq!(result, InstructionResult::NotActivated);
    }
}
