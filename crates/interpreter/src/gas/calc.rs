use super::constants::*;
use crate::{num_words, AccountLoad, SStoreResult, SelfDestructResult, StateLoad};
use primitives::{hardfork::SpecId, U256};

/// `const` Option `?`.
macro_rules! tri {
    ($e:expr) => {
        match $e {
            Some(v) => v,
            None => return None,
        }
    };
}

/// `SSTORE` opcode refund calculation.
#[allow(clippy::collapsible_else_if)]
#[inline]
pub fn sstore_refund(spec_id: SpecId, vals: &SStoreResult) -> i64 {
    if spec_id.is_enabled_in(SpecId::ISTANBUL) {
        // EIP-3529: Reduction in refunds
        let sstore_clears_schedule = if spec_id.is_enabled_in(SpecId::LONDON) {
            (SSTORE_RESET - COLD_SLOAD_COST + ACCESS_LIST_STORAGE_KEY) as i64
        } else {
            REFUND_SSTORE_CLEARS
        };
        if vals.is_new_eq_present() {
            0
        } else {
            if vals.is_original_eq_present() && vals.is_new_zero() {
                sstore_clears_schedule
            } else {
                let mut refund = 0;

                if !vals.is_original_zero() {
                    if vals.is_present_zero() {
                        refund -= sstore_clears_schedule;
                    } else if vals.is_new_zero() {
                        refund += sstore_clears_schedule;
                    }
                }

                if vals.is_original_eq_new() {
                    let (gas_sstore_reset, gas_sload) = if spec_id.is_enabled_in(SpecId::BERLIN) {
                        (SSTORE_RESET - COLD_SLOAD_COST, WARM_STORAGE_READ_COST)
                    } else {
                        (SSTORE_RESET, sload_cost(spec_id, false))
                    };
                    if vals.is_original_zero() {
                        refund += (SSTORE_SET - gas_sload) as i64;
                    } else {
                        refund += (gas_sstore_reset - gas_sload) as i64;
                    }
                }

                refund
            }
        }
    } else {
        if !vals.is_present_zero() && vals.is_new_zero() {
            REFUND_SSTORE_CLEARS
        } else {
            0
        }
    }
}

/// `CREATE2` opcode cost calculation.
#[inline]
pub const fn create2_cost(len: usize) -> Option<u64> {
    CREATE.checked_add(tri!(cost_per_word(len, KECCAK256WORD)))
}

#[inline]
const fn log2floor(value: U256) -> u64 {
    let mut l: u64 = 256;
    let mut i = 3;
    loop {
        if value.as_limbs()[i] == 0u64 {
            l -= 64;
        } else {
            l -= value.as_limbs()[i].leading_zeros() as u64;
            if l == 0 {
                return l;
            } else {
                return l - 1;
            }
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }
    l
}

/// `EXP` opcode cost calculation.
#[inline]
pub fn exp_cost(spec_id: SpecId, power: U256) -> Option<u64> {
    if power.is_zero() {
        Some(EXP)
    } else {
        // EIP-160: EXP cost increase
        let gas_byte = U256::from(if spec_id.is_enabled_in(SpecId::SPURIOUS_DRAGON) {
            50
        } else {
            10
        });
        let gas = U256::from(EXP)
            .checked_add(gas_byte.checked_mul(U256::from(log2floor(power) / 8 + 1))?)?;

        u64::try_from(gas).ok()
    }
}

/// `*COPY` opcodes cost calculation.
#[inline]
pub const fn copy_cost_verylow(len: usize) -> Option<u64> {
    copy_cost(VERYLOW, len)
}

/// `EXTCODECOPY` opcode cost calculation.
#[inline]
pub const fn extcodecopy_cost(spec_id: SpecId, len: usize, is_cold: bool) -> Option<u64> {
    let base_gas = if spec_id.is_enabled_in(SpecId::BERLIN) {
        warm_cold_cost(is_cold)
    } else if spec_id.is_enabled_in(SpecId::TANGERINE) {
        700
    } else {
        20
    };
    copy_cost(base_gas, len)
}

/// Base cost plus [`COPY`] per word of `len`.
#[inline]
pub const fn copy_cost(base_cost: u64, len: usize) -> Option<u64> {
    base_cost.checked_add(tri!(cost_per_word(len, COPY)))
}

/// `LOG` opcode cost calculation.
#[inline]
pub const fn log_cost(n: u8, len: u64) -> Option<u64> {
    tri!(LOG.checked_add(tri!(LOGDATA.checked_mul(len)))).checked_add(LOGTOPIC * n as u64)
}

/// `KECCAK256` opcode cost calculation.
#[inline]
pub const fn keccak256_cost(len: usize) -> Option<u64> {
    KECCAK256.checked_add(tri!(cost_per_word(len, KECCAK256WORD)))
}

/// Calculate the cost of buffer per word.
#[inline]
pub const fn cost_per_word(len: usize, multiple: u64) -> Option<u64> {
    multiple.checked_mul(num_words(len) as u64)
}

/// EIP-3860: Limit and meter initcode
///
/// Apply extra gas cost of 2 for every 32-byte chunk of initcode.
///
/// This cannot overflow as the initcode length is assumed to be checked.
#[inline]
pub const fn initcode_cost(len: usize) -> u64 {
    let Some(cost) = cost_per_word(len, INITCODE_WORD_COST) else {
        panic!("initcode cost overflow")
    };
    cost
}

/// `SLOAD` opcode cost calculation.
#[inline]
pub const fn sload_cost(spec_id: SpecId, is_cold: bool) -> u64 {
    if spec_id.is_enabled_in(SpecId::BERLIN) {
        if is_cold {
            COLD_SLOAD_COST
        } else {
            WARM_STORAGE_READ_COST
        }
    } else if spec_id.is_enabled_in(SpecId::ISTANBUL) {
        // EIP-1884: Repricing for trie-size-dependent opcodes
        ISTANBUL_SLOAD_GAS
    } else if spec_id.is_enabled_in(SpecId::TANGERINE) {
        // EIP-150: Gas cost changes for IO-heavy operations
        200
    } else {
        50
    }
}

/// `SSTORE` opcode cost calculation.
#[inline]
pub fn sstore_cost(spec_id: SpecId, vals: &SStoreResult, is_cold: bool) -> u64 {
    if spec_id.is_enabled_in(SpecId::BERLIN) {
        // Berlin specification logic
        let mut gas_cost = istanbul_sstore_cost::<WARM_STORAGE_READ_COST, WARM_SSTORE_RESET>(vals);

        if is_cold {
            gas_cost += COLD_SLOAD_COST;
        }
        gas_cost
    } else if spec_id.is_enabled_in(SpecId::ISTANBUL) {
        // Istanbul logic
        istanbul_sstore_cost::<ISTANBUL_SLOAD_GAS, SSTORE_RESET>(vals)
    } else {
        // Frontier logic
        frontier_sstore_cost(vals)
    }
}

/// EIP-2200: Structured Definitions for Net Gas Metering
#[inline]
fn istanbul_sstore_cost<const SLOAD_GAS: u64, const SSTORE_RESET_GAS: u64>(
    vals: &SStoreResult,
) -> u64 {
    if vals.is_new_eq_present() {
        SLOAD_GAS
    } else if vals.is_original_eq_present() && vals.is_original_zero() {
        SSTORE_SET
    } else if vals.is_original_eq_present() {
        SSTORE_RESET_GAS
    } else {
        SLOAD_GAS
    }
}

/// Frontier sstore cost just had two cases set and reset values.
#[inline]
fn frontier_sstore_cost(vals: &SStoreResult) -> u64 {
    if vals.is_present_zero() && !vals.is_new_zero() {
        SSTORE_SET
    } else {
        SSTORE_RESET
    }
}

/// `SELFDESTRUCT` opcode cost calculation.
#[inline]
pub const fn selfdestruct_cost(spec_id: SpecId, res: StateLoad<SelfDestructResult>) -> u64 {
    // EIP-161: State trie clearing (invariant-preserving alternative)
    let should_charge_topup = if spec_id.is_enabled_in(SpecId::SPURIOUS_DRAGON) {
        res.data.had_value && !res.data.target_exists
    } else {
        !res.data.target_exists
    };

    // EIP-150: Gas cost changes for IO-heavy operations
    let selfdestruct_gas_topup = if spec_id.is_enabled_in(SpecId::TANGERINE) && should_charge_topup
    {
        NEWACCOUNT
    } else {
        0
    };

    // EIP-150: Gas cost changes for IO-heavy operations
    let selfdestruct_gas = if spec_id.is_enabled_in(SpecId::TANGERINE) {
        5000
    } else {
        0
    };

    let mut gas = selfdestruct_gas + selfdestruct_gas_topup;
    if spec_id.is_enabled_in(SpecId::BERLIN) && res.is_cold {
        gas += COLD_ACCOUNT_ACCESS_COST
    }
    gas
}

/// Calculate call gas cost for the call instruction.
///
/// There is three types of gas.
/// * Account access gas. after berlin it can be cold or warm.
/// * Transfer value gas. If value is transferred and balance of target account is updated.
/// * If account is not existing and needs to be created. After Spurious dragon
///   this is only accounted if value is transferred.
///
/// `CALLCODE`, `DELEGATECALL` and `STATICCALL` never create the target, so they pass
/// an [`AccountLoad`] with `is_empty` forced to false.
#[inline]
pub const fn call_cost(spec_id: SpecId, transfers_value: bool, account_load: AccountLoad) -> u64 {
    // Account access.
    let mut gas = if spec_id.is_enabled_in(SpecId::BERLIN) {
        warm_cold_cost(account_load.is_cold)
    } else if spec_id.is_enabled_in(SpecId::TANGERINE) {
        // EIP-150: Gas cost changes for IO-heavy operations
        700
    } else {
        40
    };

    // transfer value cost
    if transfers_value {
        gas += CALLVALUE;
    }

    // new account cost
    if account_load.is_empty {
        // EIP-161: State trie clearing (invariant-preserving alternative)
        if spec_id.is_enabled_in(SpecId::SPURIOUS_DRAGON) {
            // account only if there is value transferred.
            if transfers_value {
                gas += NEWACCOUNT;
            }
        } else {
            gas += NEWACCOUNT;
        }
    }

    gas
}

/// Berlin warm and cold storage access cost for account access.
#[inline]
pub const fn warm_cold_cost(is_cold: bool) -> u64 {
    if is_cold {
        COLD_ACCOUNT_ACCESS_COST
    } else {
        WARM_STORAGE_READ_COST
    }
}

/// `BALANCE` opcode cost calculation.
#[inline]
pub const fn balance_cost(spec_id: SpecId, is_cold: bool) -> u64 {
    if spec_id.is_enabled_in(SpecId::BERLIN) {
        warm_cold_cost(is_cold)
    } else if spec_id.is_enabled_in(SpecId::ISTANBUL) {
        // EIP-1884: Repricing for trie-size-dependent opcodes
        700
    } else if spec_id.is_enabled_in(SpecId::TANGERINE) {
        400
    } else {
        20
    }
}

/// `EXTCODESIZE` opcode cost calculation.
#[inline]
pub const fn extcodesize_cost(spec_id: SpecId, is_cold: bool) -> u64 {
    if spec_id.is_enabled_in(SpecId::BERLIN) {
        warm_cold_cost(is_cold)
    } else if spec_id.is_enabled_in(SpecId::TANGERINE) {
        700
    } else {
        20
    }
}

/// `EXTCODEHASH` opcode cost calculation.
#[inline]
pub const fn extcodehash_cost(spec_id: SpecId, is_cold: bool) -> u64 {
    if spec_id.is_enabled_in(SpecId::BERLIN) {
        warm_cold_cost(is_cold)
    } else if spec_id.is_enabled_in(SpecId::ISTANBUL) {
        700
    } else {
        400
    }
}

/// Initial gas that is deducted for transaction to be included.
/// Initial gas contains initial stipend gas, gas for access list and input data.
pub fn validate_initial_tx_gas(
    spec_id: SpecId,
    input: &[u8],
    is_create: bool,
    access_list_accounts: u64,
    access_list_storages: u64,
) -> u64 {
    let mut initial_gas = 0;
    let zero_data_len = input.iter().filter(|v| **v == 0).count() as u64;
    let non_zero_data_len = input.len() as u64 - zero_data_len;

    // initdate stipend
    initial_gas += zero_data_len * TRANSACTION_ZERO_DATA;
    // EIP-2028: Transaction data gas cost reduction
    initial_gas += non_zero_data_len
        * if spec_id.is_enabled_in(SpecId::ISTANBUL) {
            TRANSACTION_NON_ZERO_DATA_ISTANBUL
        } else {
            TRANSACTION_NON_ZERO_DATA_FRONTIER
        };

    // get number of access list account and storages.
    if spec_id.is_enabled_in(SpecId::BERLIN) {
        initial_gas += access_list_accounts * ACCESS_LIST_ADDRESS;
        initial_gas += access_list_storages * ACCESS_LIST_STORAGE_KEY;
    }

    // base stipend
    initial_gas += if is_create && spec_id.is_enabled_in(SpecId::HOMESTEAD) {
        // EIP-2: Homestead Hard-fork Changes
        TRANSACTION_CREATE_BASE
    } else {
        TRANSACTION_BASE
    };

    // EIP-3860: Limit and meter initcode
    // Init code stipend for bytecode analysis
    if spec_id.is_enabled_in(SpecId::SHANGHAI) && is_create {
        initial_gas += initcode_cost(input.len())
    }

    initial_gas
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn vals(original: u64, present: u64, new: u64) -> SStoreResult {
        SStoreResult {
            original_value: U256::from(original),
            present_value: U256::from(present),
            new_value: U256::from(new),
        }
    }

    #[rstest]
    #[case(SpecId::CANCUN, 0, 0, 1, false, 20_000)]
    #[case(SpecId::CANCUN, 0, 0, 1, true, 22_100)]
    #[case(SpecId::CANCUN, 1, 1, 2, false, 2_900)]
    #[case(SpecId::CANCUN, 1, 2, 3, false, 100)]
    #[case(SpecId::CANCUN, 1, 1, 1, false, 100)]
    #[case(SpecId::ISTANBUL, 1, 1, 1, false, 800)]
    #[case(SpecId::ISTANBUL, 0, 0, 1, false, 20_000)]
    #[case(SpecId::FRONTIER, 0, 0, 1, false, 20_000)]
    #[case(SpecId::FRONTIER, 0, 1, 2, false, 5_000)]
    fn sstore_costs(
        #[case] spec: SpecId,
        #[case] original: u64,
        #[case] present: u64,
        #[case] new: u64,
        #[case] is_cold: bool,
        #[case] expected: u64,
    ) {
        assert_eq!(
            sstore_cost(spec, &vals(original, present, new), is_cold),
            expected
        );
    }

    #[rstest]
    // clearing a slot that was set before the transaction
    #[case(SpecId::CANCUN, 1, 1, 0, 4_800)]
    #[case(SpecId::BERLIN, 1, 1, 0, 15_000)]
    // setting a fresh slot and clearing it again
    #[case(SpecId::CANCUN, 0, 1, 0, 19_900)]
    #[case(SpecId::CANCUN, 1, 1, 1, 0)]
    #[case(SpecId::FRONTIER, 1, 1, 0, 15_000)]
    fn sstore_refunds(
        #[case] spec: SpecId,
        #[case] original: u64,
        #[case] present: u64,
        #[case] new: u64,
        #[case] expected: i64,
    ) {
        assert_eq!(sstore_refund(spec, &vals(original, present, new)), expected);
    }

    #[rstest]
    #[case(SpecId::CANCUN, U256::ZERO, 10)]
    #[case(SpecId::CANCUN, U256::from(1), 60)]
    #[case(SpecId::CANCUN, U256::from(256), 110)]
    #[case(SpecId::HOMESTEAD, U256::from(256), 30)]
    #[case(SpecId::CANCUN, U256::MAX, 10 + 50 * 32)]
    fn exp_costs(#[case] spec: SpecId, #[case] power: U256, #[case] expected: u64) {
        assert_eq!(exp_cost(spec, power), Some(expected));
    }

    #[test]
    fn call_cost_schedules() {
        let cold_empty = AccountLoad {
            is_cold: true,
            is_empty: true,
        };
        assert_eq!(call_cost(SpecId::CANCUN, false, cold_empty), 2_600);
        assert_eq!(call_cost(SpecId::CANCUN, true, cold_empty), 2_600 + 9_000 + 25_000);
        assert_eq!(call_cost(SpecId::TANGERINE, false, cold_empty), 700 + 25_000);
        assert_eq!(call_cost(SpecId::FRONTIER, false, AccountLoad::default()), 40);
    }

    #[test]
    fn initial_gas() {
        assert_eq!(validate_initial_tx_gas(SpecId::CANCUN, &[], false, 0, 0), 21_000);
        assert_eq!(
            validate_initial_tx_gas(SpecId::CANCUN, &[0, 1], false, 1, 2),
            21_000 + 4 + 16 + 2_400 + 2 * 1_900
        );
        assert_eq!(
            validate_initial_tx_gas(SpecId::FRONTIER, &[1], false, 1, 1),
            21_000 + 68
        );
        // 33 bytes of initcode are two words
        assert_eq!(
            validate_initial_tx_gas(SpecId::CANCUN, &[0; 33], true, 0, 0),
            53_000 + 33 * 4 + 2 * 2
        );
    }

    #[test]
    fn copy_and_log_costs() {
        assert_eq!(copy_cost_verylow(0), Some(3));
        assert_eq!(copy_cost_verylow(33), Some(9));
        assert_eq!(keccak256_cost(32), Some(36));
        assert_eq!(log_cost(2, 10), Some(375 + 80 + 750));
        assert_eq!(create2_cost(64), Some(32_000 + 12));
    }
}
