//! This module contains [`CfgEnv`].
use primitives::{hardfork::SpecId, MAX_CODE_SIZE, MAX_INITCODE_SIZE};

/// EVM configuration
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CfgEnv {
    /// Chain ID of the EVM. Used in CHAINID opcode and transaction's chain ID check.
    ///
    /// Chain ID is introduced EIP-155.
    pub chain_id: u64,
    /// Specification for EVM represent the hardfork
    pub spec: SpecId,
    /// If some it will effects EIP-170: Contract code size limit.
    ///
    /// Useful to increase this because of tests.
    ///
    /// By default it is `0x6000` (~25kb).
    pub limit_contract_code_size: Option<usize>,
    /// A hard memory limit in bytes beyond which memory cannot be resized.
    ///
    /// Defaults to `2^32 - 1` bytes per EIP-1985.
    pub memory_limit: u64,
    /// Skip balance checks if `true`
    ///
    /// Adds transaction cost to balance to ensure execution doesn't fail.
    pub disable_balance_check: bool,
    /// Allows a transaction gas limit above the block gas limit.
    pub disable_block_gas_limit: bool,
    /// Disables base fee checks for EIP-1559 transactions.
    ///
    /// This is useful for testing method calls with zero gas price.
    pub disable_base_fee: bool,
}

impl CfgEnv {
    /// Creates a configuration for the given hardfork with every other field defaulted.
    pub fn new_with_spec(spec: SpecId) -> Self {
        Self {
            spec,
            ..Default::default()
        }
    }

    /// Sets the chain id.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Maximum size of deployed code.
    #[inline]
    pub fn max_code_size(&self) -> usize {
        self.limit_contract_code_size.unwrap_or(MAX_CODE_SIZE)
    }

    /// Maximum size of initcode, twice the code size limit.
    #[inline]
    pub fn max_initcode_size(&self) -> usize {
        self.limit_contract_code_size
            .map(|limit| limit.saturating_mul(2))
            .unwrap_or(MAX_INITCODE_SIZE)
    }
}

impl Default for CfgEnv {
    fn default() -> Self {
        Self {
            chain_id: 1,
            spec: SpecId::default(),
            limit_contract_code_size: None,
            memory_limit: (1 << 32) - 1,
            disable_balance_check: false,
            disable_block_gas_limit: false,
            disable_base_fee: false,
        }
    }
}
