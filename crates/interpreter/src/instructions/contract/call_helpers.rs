use crate::{gas, AccountLoad, Interpreter};
use core::{cmp::min, ops::Range};
use primitives::{hardfork::SpecId, Bytes};

/// Pops the input and output memory ranges of a call, expanding memory for both.
///
/// Returns the copied input and the range the output will be written to.
#[inline]
pub fn get_memory_input_and_out_ranges(
    interpreter: &mut Interpreter,
) -> Option<(Bytes, Range<usize>)> {
    popn!([in_offset, in_len, out_offset, out_len], interpreter, None);

    let in_len = as_usize_or_fail_ret!(interpreter, in_len, None);
    let input = if in_len != 0 {
        let in_offset = as_usize_or_fail_ret!(interpreter, in_offset, None);
        resize_memory!(interpreter, in_offset, in_len, None);
        Bytes::copy_from_slice(interpreter.memory.slice(in_offset, in_len))
    } else {
        Bytes::new()
    };

    let out_len = as_usize_or_fail_ret!(interpreter, out_len, None);
    let out_offset = if out_len != 0 {
        let out_offset = as_usize_or_fail_ret!(interpreter, out_offset, None);
        resize_memory!(interpreter, out_offset, out_len, None);
        out_offset
    } else {
        usize::MAX //unrealistic value so we are sure it is not used
    };

    Some((input, out_offset..out_offset.saturating_add(out_len)))
}

/// Charges the call cost and returns the gas forwarded to the callee, before the stipend.
#[inline]
pub fn calc_call_gas(
    interpreter: &mut Interpreter,
    account_load: AccountLoad,
    has_transfer: bool,
    local_gas_limit: u64,
) -> Option<u64> {
    let call_cost = gas::call_cost(interpreter.spec_id, has_transfer, account_load);
    gas!(interpreter, call_cost, None);

    // EIP-150: Gas cost changes for IO-heavy operations
    let gas_limit = if interpreter.spec_id.is_enabled_in(SpecId::TANGERINE) {
        let gas = interpreter.gas.remaining();
        // take l64 part of gas_limit
        min(gas - gas / 64, local_gas_limit)
    } else {
        local_gas_limit
    };

    Some(gas_limit)
}
