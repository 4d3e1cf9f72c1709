//! Input padding helpers.
use std::borrow::Cow;

/// Right-pads the given slice with zeroes until `LEN`.
///
/// Returns the first `LEN` bytes if it does not need padding.
#[inline]
pub fn right_pad<const LEN: usize>(data: &[u8]) -> Cow<'_, [u8; LEN]> {
    match data.get(..LEN).and_then(|data| <&[u8; LEN]>::try_from(data).ok()) {
        Some(data) => Cow::Borrowed(data),
        None => {
            let mut padded = [0; LEN];
            let len = data.len().min(LEN);
            padded[..len].copy_from_slice(&data[..len]);
            Cow::Owned(padded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_padding() {
        let data = [1, 2, 3, 4];
        let padded = right_pad::<8>(&data);
        assert!(matches!(padded, Cow::Owned(_)));
        assert_eq!(padded[..], [1, 2, 3, 4, 0, 0, 0, 0]);

        let truncated = right_pad::<2>(&data);
        assert!(matches!(truncated, Cow::Borrowed(_)));
        assert_eq!(truncated[..], [1, 2]);
    }
}
