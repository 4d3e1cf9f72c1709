//! EIP-4844 constants and the blob gas fee market.
use alloy_primitives::U256;

/// First version of the blob.
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

/// Gas consumption of a single data blob (== blob byte size).
pub const GAS_PER_BLOB: u64 = 1 << 17;

/// Target number of the blob per block.
pub const TARGET_BLOB_NUMBER_PER_BLOCK: u64 = 3;

/// Max number of blobs per block.
pub const MAX_BLOB_NUMBER_PER_BLOCK: u64 = 2 * TARGET_BLOB_NUMBER_PER_BLOCK;

/// Maximum consumable blob gas for data blobs per block.
pub const MAX_BLOB_GAS_PER_BLOCK: u64 = MAX_BLOB_NUMBER_PER_BLOCK * GAS_PER_BLOB;

/// Target consumable blob gas for data blobs per block (for 1559-like pricing).
pub const TARGET_BLOB_GAS_PER_BLOCK: u64 = TARGET_BLOB_NUMBER_PER_BLOCK * GAS_PER_BLOB;

/// Minimum gas price for data blobs.
pub const MIN_BLOB_GASPRICE: u64 = 1;

/// Controls the maximum rate of change for blob gas price.
pub const BLOB_GASPRICE_UPDATE_FRACTION: u64 = 3_338_477;

/// Calculates the `excess_blob_gas` from the parent header's `blob_gas_used` and `excess_blob_gas`.
///
/// See also [the EIP-4844 helpers]<https://eips.ethereum.org/EIPS/eip-4844#helpers>
/// (`calc_excess_blob_gas`).
#[inline]
pub const fn calc_excess_blob_gas(parent_excess_blob_gas: u64, parent_blob_gas_used: u64) -> u64 {
    parent_excess_blob_gas
        .saturating_add(parent_blob_gas_used)
        .saturating_sub(TARGET_BLOB_GAS_PER_BLOCK)
}

/// Calculates the blob gas price from the header's excess blob gas field.
///
/// See also [the EIP-4844 helpers](https://eips.ethereum.org/EIPS/eip-4844#helpers)
/// (`get_blob_gasprice`).
#[inline]
pub fn calc_blob_gasprice(excess_blob_gas: u64) -> u128 {
    fake_exponential(
        MIN_BLOB_GASPRICE,
        excess_blob_gas,
        BLOB_GASPRICE_UPDATE_FRACTION,
    )
}

/// Approximates `factor * e ** (numerator / denominator)` using Taylor expansion.
///
/// This is used to calculate the blob price.
///
/// See also [the EIP-4844 helpers](https://eips.ethereum.org/EIPS/eip-4844#helpers)
/// (`fake_exponential`).
///
/// The result saturates at [`u128::MAX`].
///
/// # Panics
///
/// This function panics if `denominator` is zero.
#[inline]
pub fn fake_exponential(factor: u64, numerator: u64, denominator: u64) -> u128 {
    assert_ne!(denominator, 0, "attempt to divide by zero");
    let numerator = U256::from(numerator);
    let denominator = U256::from(denominator);
    let ceiling = U256::from(u128::MAX);

    let mut i = U256::from(1);
    let mut output = U256::ZERO;
    let mut numerator_accum = U256::from(factor) * denominator;
    while !numerator_accum.is_zero() {
        output += numerator_accum;
        // Terms are never negative, so the sum only grows from here.
        if output / denominator > ceiling {
            return u128::MAX;
        }
        // `numerator_accum <= output < 2^192`, the product stays below 2^256.
        numerator_accum = (numerator_accum * numerator) / (denominator * i);
        i += U256::from(1);
    }
    (output / denominator).saturating_to()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // https://github.com/ethereum/go-ethereum/blob/28857080d732857030eda80c69b9ba2c8926f221/consensus/misc/eip4844/eip4844_test.go#L27
    #[rstest]
    #[case(0, 0, 0)]
    #[case(0, TARGET_BLOB_GAS_PER_BLOCK, 0)]
    #[case(0, TARGET_BLOB_GAS_PER_BLOCK + GAS_PER_BLOB, GAS_PER_BLOB)]
    #[case(TARGET_BLOB_GAS_PER_BLOCK, 1, 1)]
    #[case(TARGET_BLOB_GAS_PER_BLOCK, 0, 0)]
    #[case(
        TARGET_BLOB_GAS_PER_BLOCK,
        GAS_PER_BLOB * 2,
        GAS_PER_BLOB * 2
    )]
    fn test_calc_excess_blob_gas(#[case] excess: u64, #[case] used: u64, #[case] expected: u64) {
        assert_eq!(calc_excess_blob_gas(excess, used), expected);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1_000, 1)]
    #[case(2_314_057, 1)]
    #[case(2_314_058, 2)]
    #[case(10 * 1024 * 1024, 23)]
    #[case(1 << 24, 152)]
    #[case(1 << 26, 537_070_730)]
    fn test_calc_blob_gasprice(#[case] excess: u64, #[case] expected: u128) {
        assert_eq!(calc_blob_gasprice(excess), expected);
    }

    // https://github.com/ethereum/go-ethereum/blob/28857080d732857030eda80c69b9ba2c8926f221/consensus/misc/eip4844/eip4844_test.go#L78
    #[rstest]
    #[case(1, 0, 1, 1)]
    #[case(38493, 0, 1000, 38493)]
    #[case(0, 1234, 2345, 0)]
    #[case(1, 2, 1, 6)]
    #[case(1, 4, 2, 6)]
    #[case(1, 3, 1, 16)]
    #[case(1, 6, 2, 18)]
    #[case(1, 4, 1, 49)]
    #[case(1, 8, 2, 50)]
    #[case(10, 8, 2, 542)]
    #[case(11, 8, 2, 596)]
    #[case(1, 5, 1, 136)]
    #[case(1, 5, 2, 11)]
    #[case(2, 5, 2, 23)]
    #[case(1, 50000000, 2225652, 5709098764)]
    fn test_fake_exponential(
        #[case] factor: u64,
        #[case] numerator: u64,
        #[case] denominator: u64,
        #[case] expected: u128,
    ) {
        assert_eq!(fake_exponential(factor, numerator, denominator), expected);
    }

    #[test]
    fn zero_numerator_returns_factor() {
        for denominator in [1, 7, 1_000, BLOB_GASPRICE_UPDATE_FRACTION, u64::MAX] {
            for factor in [0, 1, 17, 1_000_000] {
                assert_eq!(
                    fake_exponential(factor, 0, denominator),
                    factor as u128,
                    "factor {factor} denominator {denominator}"
                );
            }
        }
    }

    #[test]
    fn blob_gasprice_is_monotonic_in_excess() {
        let mut last = 0;
        for excess in (0..(1u64 << 26)).step_by(1 << 18) {
            let price = calc_blob_gasprice(excess);
            assert!(price >= last, "price dropped at excess {excess}");
            last = price;
        }
    }

    #[rstest]
    #[case(400_000_000)]
    #[case(1 << 40)]
    #[case(u64::MAX)]
    fn blob_gasprice_saturates(#[case] excess: u64) {
        assert_eq!(calc_blob_gasprice(excess), u128::MAX);
    }

    #[test]
    fn blob_gasprice_is_monotonic_up_to_saturation() {
        let mut last = 0;
        for excess in (1u64 << 26..400_000_000).step_by(1 << 22) {
            let price = calc_blob_gasprice(excess);
            assert!(price >= last, "price dropped at excess {excess}");
            last = price;
        }
        assert_eq!(calc_blob_gasprice(400_000_000), u128::MAX);
    }

    #[test]
    fn excess_blob_gas_saturates() {
        assert_eq!(
            calc_excess_blob_gas(u64::MAX, u64::MAX),
            u64::MAX - TARGET_BLOB_GAS_PER_BLOCK
        );
    }

    #[test]
    #[should_panic(expected = "attempt to divide by zero")]
    fn zero_denominator_panics() {
        fake_exponential(1, 1, 0);
    }
}
