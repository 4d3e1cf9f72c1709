use bytecode::Bytecode;
use primitives::{Address, Bytes, U256};

/// Code and call context of the frame being executed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Contract {
    /// Call data.
    pub input: Bytes,
    /// Analyzed and padded code.
    pub bytecode: Bytecode,
    /// Address whose storage and balance the frame acts on.
    pub target_address: Address,
    /// Address the code was loaded from. Differs from `target_address` for `DELEGATECALL` and
    /// `CALLCODE`, `None` for init code.
    pub bytecode_address: Option<Address>,
    /// Caller of the frame.
    pub caller: Address,
    /// Value returned by `CALLVALUE`.
    pub call_value: U256,
}

impl Contract {
    /// Instantiates a new contract.
    pub fn new(
        input: Bytes,
        bytecode: Bytecode,
        target_address: Address,
        bytecode_address: Option<Address>,
        caller: Address,
        call_value: U256,
    ) -> Self {
        Self {
            input,
            bytecode,
            target_address,
            bytecode_address,
            caller,
            call_value,
        }
    }

    /// Returns whether the given position is a valid jump destination.
    #[inline]
    pub fn is_valid_jump(&self, pos: usize) -> bool {
        self.bytecode.is_valid_jump(pos)
    }
}
