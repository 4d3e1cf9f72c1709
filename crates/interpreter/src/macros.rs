//! Utility macros to help implementing opcode instruction functions.

/// Fails the instruction with `NotActivated` if the frame's spec is older than `$min`.
macro_rules! check {
    ($interpreter:expr, $min:ident) => {
        if !$interpreter
            .spec_id
            .is_enabled_in(primitives::hardfork::SpecId::$min)
        {
            $interpreter.instruction_result = $crate::InstructionResult::NotActivated;
            return;
        }
    };
}

/// Fails the instruction if the current call is static.
macro_rules! require_non_staticcall {
    ($interpreter:expr) => {
        if $interpreter.is_static {
            $interpreter.instruction_result = $crate::InstructionResult::StateChangeDuringStaticCall;
            return;
        }
    };
}

/// Records a `gas` cost and fails the instruction if it would exceed the available gas.
macro_rules! gas {
    ($interpreter:expr, $gas:expr) => {
        gas!($interpreter, $gas, ())
    };
    ($interpreter:expr, $gas:expr, $ret:expr) => {
        if !$interpreter.gas.record_cost($gas) {
            $interpreter.instruction_result = $crate::InstructionResult::OutOfGas;
            return $ret;
        }
    };
}

/// Same as [`gas!`], but with `gas` as an option.
macro_rules! gas_or_fail {
    ($interpreter:expr, $gas:expr) => {
        gas_or_fail!($interpreter, $gas, ())
    };
    ($interpreter:expr, $gas:expr, $ret:expr) => {
        match $gas {
            Some(gas_used) => gas!($interpreter, gas_used, $ret),
            None => {
                $interpreter.instruction_result = $crate::InstructionResult::OutOfGas;
                return $ret;
            }
        }
    };
}

/// Resizes the frame memory to cover `offset..offset + len`, charging the expansion.
/// Fails the instruction if the memory limit or the gas limit is exceeded.
macro_rules! resize_memory {
    ($interpreter:expr, $offset:expr, $len:expr) => {
        resize_memory!($interpreter, $offset, $len, ())
    };
    ($interpreter:expr, $offset:expr, $len:expr, $ret:expr) => {
        if !$interpreter.resize_memory($offset, $len) {
            return $ret;
        }
    };
}

/// Pops n values from the stack. Fails the instruction if n values can't be popped.
macro_rules! popn {
    ([ $($x:ident),* ], $interpreter:expr $(,$ret:expr)? ) => {
        let Some([$( $x ),*]) = $interpreter.stack.popn() else {
            $interpreter.instruction_result = $crate::InstructionResult::StackUnderflow;
            return $($ret)?;
        };
    };
}

/// Pops n values from the stack and returns a mutable reference to the new top.
/// Fails the instruction if n + 1 values are not available.
macro_rules! popn_top {
    ([ $($x:ident),* ], $top:ident, $interpreter:expr $(,$ret:expr)? ) => {
        let Some(([$( $x ),*], $top)) = $interpreter.stack.popn_top() else {
            $interpreter.instruction_result = $crate::InstructionResult::StackUnderflow;
            return $($ret)?;
        };
    };
}

/// Pushes a `U256` value onto the stack. Fails the instruction if the stack is full.
macro_rules! push {
    ($interpreter:expr, $x:expr) => {
        if let Err(result) = $interpreter.stack.push($x) {
            $interpreter.instruction_result = result;
            return;
        }
    };
}

/// Pushes a `B256` value onto the stack. Fails the instruction if the stack is full.
macro_rules! push_b256 {
    ($interpreter:expr, $x:expr) => {
        push!($interpreter, primitives::U256::from_be_bytes($x.0))
    };
}

/// Converts a `U256` value to a `u64`, saturating to `MAX` if the value is too large.
macro_rules! as_u64_saturated {
    ($v:expr) => {{
        let x = $v.as_limbs();
        if (x[1] == 0) & (x[2] == 0) & (x[3] == 0) {
            x[0]
        } else {
            u64::MAX
        }
    }};
}

/// Converts a `U256` value to a `usize`, saturating to `MAX` if the value is too large.
macro_rules! as_usize_saturated {
    ($v:expr) => {
        usize::try_from(as_u64_saturated!($v)).unwrap_or(usize::MAX)
    };
}

/// Converts a `U256` value to a `usize`, failing the instruction if the value is too large.
macro_rules! as_usize_or_fail {
    ($interpreter:expr, $v:expr) => {
        as_usize_or_fail_ret!(
            $interpreter,
            $v,
            $crate::InstructionResult::InvalidOperandOOG,
            ()
        )
    };
    ($interpreter:expr, $v:expr, $reason:expr) => {
        as_usize_or_fail_ret!($interpreter, $v, $reason, ())
    };
}

/// Converts a `U256` value to a `usize` and returns `ret`,
/// failing the instruction if the value is too large.
macro_rules! as_usize_or_fail_ret {
    ($interpreter:expr, $v:expr, $ret:expr) => {
        as_usize_or_fail_ret!(
            $interpreter,
            $v,
            $crate::InstructionResult::InvalidOperandOOG,
            $ret
        )
    };
    ($interpreter:expr, $v:expr, $reason:expr, $ret:expr) => {{
        let x = $v.as_limbs();
        if (x[0] > usize::MAX as u64) | (x[1] != 0) | (x[2] != 0) | (x[3] != 0) {
            $interpreter.instruction_result = $reason;
            return $ret;
        }
        x[0] as usize
    }};
}
