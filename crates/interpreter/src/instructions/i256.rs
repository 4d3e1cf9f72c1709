use core::cmp::Ordering;
use primitives::U256;

/// Sign of a two's complement 256-bit word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sign {
    /// Negative, the sign bit is set.
    Minus,
    /// Zero.
    Zero,
    /// Positive.
    Plus,
}

/// `2^255 - 1`, every bit but the sign bit.
pub const MAX_POSITIVE_VALUE: U256 = U256::from_limbs([
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
    0x7FFFFFFFFFFFFFFF,
]);

/// `-2^255`, only the sign bit.
pub const MIN_NEGATIVE_VALUE: U256 = U256::from_limbs([
    0x0000000000000000,
    0x0000000000000000,
    0x0000000000000000,
    0x8000000000000000,
]);

const FLIPH_BITMASK_U64: u64 = 0x7FFFFFFFFFFFFFFF;

/// Returns the sign of `val`. With `DO_TWO_COMPL` negative values are replaced by their
/// magnitude.
#[inline]
pub fn i256_sign<const DO_TWO_COMPL: bool>(val: &mut U256) -> Sign {
    if !val.bit(U256::BITS - 1) {
        if val.is_zero() {
            Sign::Zero
        } else {
            Sign::Plus
        }
    } else {
        if DO_TWO_COMPL {
            two_compl_mut(val);
        }
        Sign::Minus
    }
}

#[inline]
fn u256_remove_sign(val: &mut U256) {
    let mut limbs = val.into_limbs();
    limbs[3] &= FLIPH_BITMASK_U64;
    *val = U256::from_limbs(limbs);
}

#[inline]
pub fn two_compl_mut(op: &mut U256) {
    *op = two_compl(*op);
}

#[inline]
pub fn two_compl(op: U256) -> U256 {
    op.wrapping_neg()
}

#[inline]
pub fn i256_cmp(first: &U256, second: &U256) -> Ordering {
    let first_sign = i256_sign::<false>(&mut { *first });
    let second_sign = i256_sign::<false>(&mut { *second });
    match first_sign.cmp(&second_sign) {
        // Same sign, two's complement keeps the order.
        Ordering::Equal => first.cmp(second),
        o => o,
    }
}

/// Signed division, truncating toward zero. Division by zero is zero and
/// `MIN_NEGATIVE_VALUE / -1` wraps to `MIN_NEGATIVE_VALUE`.
#[inline]
pub fn i256_div(mut first: U256, mut second: U256) -> U256 {
    let second_sign = i256_sign::<true>(&mut second);
    if second_sign == Sign::Zero {
        return U256::ZERO;
    }

    let first_sign = i256_sign::<true>(&mut first);
    if first == MIN_NEGATIVE_VALUE && second == U256::from(1) {
        return two_compl(MIN_NEGATIVE_VALUE);
    }

    let mut d = first / second;
    u256_remove_sign(&mut d);

    if d.is_zero() {
        return U256::ZERO;
    }

    match (first_sign, second_sign) {
        (Sign::Zero, Sign::Plus)
        | (Sign::Plus, Sign::Zero)
        | (Sign::Zero, Sign::Zero)
        | (Sign::Plus, Sign::Plus)
        | (Sign::Minus, Sign::Minus) => d,
        (Sign::Zero, Sign::Minus)
        | (Sign::Plus, Sign::Minus)
        | (Sign::Minus, Sign::Zero)
        | (Sign::Minus, Sign::Plus) => two_compl(d),
    }
}

/// Signed remainder. The result takes the sign of the dividend.
#[inline]
pub fn i256_mod(mut first: U256, mut second: U256) -> U256 {
    let first_sign = i256_sign::<true>(&mut first);
    if first_sign == Sign::Zero {
        return U256::ZERO;
    }

    let second_sign = i256_sign::<true>(&mut second);
    if second_sign == Sign::Zero {
        return U256::ZERO;
    }

    let mut r = first % second;
    u256_remove_sign(&mut r);

    if r.is_zero() {
        return U256::ZERO;
    }

    if first_sign == Sign::Minus {
        two_compl(r)
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::num::Wrapping;

    #[test]
    fn div_i256() {
        // Sanity checks based on i8. Notice that we need to use `Wrapping` here because
        // Rust will prevent the overflow by default whereas the EVM does not.
        assert_eq!(Wrapping(i8::MIN) / Wrapping(-1), Wrapping(i8::MIN));
        assert_eq!(i8::MAX / -1, -i8::MAX);

        let one = U256::from(1);
        let one_hundred = U256::from(100);
        let fifty = U256::from(50);
        let two = U256::from(2);
        let neg_one_hundred = two_compl(one_hundred);
        let minus_one = two_compl(one);
        let neg_max_value = two_compl(MAX_POSITIVE_VALUE);

        assert_eq!(i256_div(MIN_NEGATIVE_VALUE, minus_one), MIN_NEGATIVE_VALUE);
        assert_eq!(i256_div(MIN_NEGATIVE_VALUE, one), MIN_NEGATIVE_VALUE);
        assert_eq!(i256_div(MAX_POSITIVE_VALUE, one), MAX_POSITIVE_VALUE);
        assert_eq!(i256_div(MAX_POSITIVE_VALUE, minus_one), neg_max_value);
        assert_eq!(i256_div(one_hundred, minus_one), neg_one_hundred);
        assert_eq!(i256_div(one_hundred, two), fifty);
        assert_eq!(i256_div(neg_one_hundred, two), two_compl(fifty));
        assert_eq!(i256_div(one_hundred, U256::ZERO), U256::ZERO);
    }

    #[test]
    fn mod_i256() {
        let seven = U256::from(7);
        let three = U256::from(3);
        assert_eq!(i256_mod(seven, three), U256::from(1));
        assert_eq!(i256_mod(two_compl(seven), three), two_compl(U256::from(1)));
        assert_eq!(i256_mod(seven, two_compl(three)), U256::from(1));
        assert_eq!(i256_mod(seven, U256::ZERO), U256::ZERO);
    }

    #[test]
    fn cmp_i256() {
        let minus_one = U256::MAX;
        assert_eq!(i256_cmp(&minus_one, &U256::ZERO), Ordering::Less);
        assert_eq!(i256_cmp(&U256::from(1), &minus_one), Ordering::Greater);
        assert_eq!(i256_cmp(&MIN_NEGATIVE_VALUE, &minus_one), Ordering::Less);
        assert_eq!(i256_cmp(&U256::from(5), &U256::from(5)), Ordering::Equal);
    }
}
