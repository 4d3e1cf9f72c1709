//! Gas prices. Unless noted they are the Frontier values.

// Opcode tiers.
pub const BASE: u64 = 2;
pub const VERYLOW: u64 = 3;
pub const LOW: u64 = 5;
pub const MID: u64 = 8;
pub const HIGH: u64 = 10;
pub const JUMPDEST: u64 = 1;
pub const BLOCKHASH: u64 = 20;

/// Static part of `EXP`. The per-byte part depends on the fork.
pub const EXP: u64 = 10;
/// Linear part of memory expansion, per word.
pub const MEMORY: u64 = 3;
/// Per word copied by the `*COPY` opcodes.
pub const COPY: u64 = 3;
pub const KECCAK256: u64 = 30;
pub const KECCAK256WORD: u64 = 6;
pub const LOG: u64 = 375;
pub const LOGDATA: u64 = 8;
pub const LOGTOPIC: u64 = 375;

// Calls and creations.
pub const CREATE: u64 = 32000;
/// Per byte of deployed code.
pub const CODEDEPOSIT: u64 = 200;
/// Surcharge of a call that moves value.
pub const CALLVALUE: u64 = 9000;
/// Surcharge of a call that brings an account into existence.
pub const NEWACCOUNT: u64 = 25000;
/// Gas handed to the callee on top of the forwarded amount when value moves.
pub const CALL_STIPEND: u64 = 2300;
/// Refund for the first `SELFDESTRUCT` of an account, until London.
pub const SELFDESTRUCT: i64 = 24000;
/// EIP-3860: per word of initcode.
pub const INITCODE_WORD_COST: u64 = 2;

// Storage.
pub const SSTORE_SET: u64 = 20000;
pub const SSTORE_RESET: u64 = 5000;
pub const REFUND_SSTORE_CLEARS: i64 = 15000;
/// EIP-1884: `SLOAD` from Istanbul until Berlin.
pub const ISTANBUL_SLOAD_GAS: u64 = 800;

// EIP-2929 warm and cold access, from Berlin.
pub const COLD_SLOAD_COST: u64 = 2100;
pub const COLD_ACCOUNT_ACCESS_COST: u64 = 2600;
pub const WARM_STORAGE_READ_COST: u64 = 100;
pub const WARM_SSTORE_RESET: u64 = SSTORE_RESET - COLD_SLOAD_COST;
/// EIP-2930: per address in the access list.
pub const ACCESS_LIST_ADDRESS: u64 = 2400;
/// EIP-2930: per storage key in the access list.
pub const ACCESS_LIST_STORAGE_KEY: u64 = 1900;

// Intrinsic gas.
/// Base cost of every transaction.
pub const TRANSACTION_BASE: u64 = 21000;
/// EIP-2: base cost of a contract creation transaction from Homestead.
pub const TRANSACTION_CREATE_BASE: u64 = 53000;
/// Per zero byte of calldata.
pub const TRANSACTION_ZERO_DATA: u64 = 4;
/// Per non-zero byte of calldata before Istanbul.
pub const TRANSACTION_NON_ZERO_DATA_FRONTIER: u64 = 68;
/// EIP-2028: per non-zero byte of calldata from Istanbul.
pub const TRANSACTION_NON_ZERO_DATA_ISTANBUL: u64 = 16;
