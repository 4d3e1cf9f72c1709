//! Hardforks the interpreter can follow.
#![allow(non_camel_case_types)]

use core::{fmt, str::FromStr};
pub use SpecId::*;

/// Mainnet hardforks in activation order. Gas prices and opcode availability are keyed on them.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecId {
    FRONTIER = 0,
    FRONTIER_THAWING,
    HOMESTEAD,
    DAO_FORK,
    TANGERINE,
    SPURIOUS_DRAGON,
    BYZANTIUM,
    /// Never activated on its own; mainnet went straight to Petersburg.
    CONSTANTINOPLE,
    PETERSBURG,
    ISTANBUL,
    MUIR_GLACIER,
    BERLIN,
    LONDON,
    ARROW_GLACIER,
    GRAY_GLACIER,
    /// Paris.
    MERGE,
    SHANGHAI,
    #[default]
    CANCUN,
}

/// Names accepted by `--spec` and written by [`SpecId`]'s `Display`, indexed by discriminant.
const NAMES: [(SpecId, &str); 18] = [
    (FRONTIER, "Frontier"),
    (FRONTIER_THAWING, "FrontierThawing"),
    (HOMESTEAD, "Homestead"),
    (DAO_FORK, "DaoFork"),
    (TANGERINE, "Tangerine"),
    (SPURIOUS_DRAGON, "SpuriousDragon"),
    (BYZANTIUM, "Byzantium"),
    (CONSTANTINOPLE, "Constantinople"),
    (PETERSBURG, "Petersburg"),
    (ISTANBUL, "Istanbul"),
    (MUIR_GLACIER, "MuirGlacier"),
    (BERLIN, "Berlin"),
    (LONDON, "London"),
    (ARROW_GLACIER, "ArrowGlacier"),
    (GRAY_GLACIER, "GrayGlacier"),
    (MERGE, "Merge"),
    (SHANGHAI, "Shanghai"),
    (CANCUN, "Cancun"),
];

impl SpecId {
    /// The newest hardfork the engine implements.
    pub const LATEST: Self = Self::CANCUN;

    /// Returns `true` if `other` is active once `self` is.
    #[inline]
    pub const fn is_enabled_in(self, other: Self) -> bool {
        self as u8 >= other as u8
    }

    /// Name used in traces and on the command line.
    pub const fn name(self) -> &'static str {
        NAMES[self as usize].1
    }
}

/// Returned by [`SpecId::from_str`] for a name no hardfork has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnknownHardfork;

impl fmt::Display for UnknownHardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown hardfork")
    }
}

impl core::error::Error for UnknownHardfork {}

impl FromStr for SpecId {
    type Err = UnknownHardfork;

    /// Case-insensitive. `Latest` selects [`SpecId::LATEST`] and `Paris` is an alias of `Merge`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::LATEST);
        }
        if s.eq_ignore_ascii_case("paris") {
            return Ok(Self::MERGE);
        }
        NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(spec, _)| *spec)
            .ok_or(UnknownHardfork)
    }
}

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_in_is_ordered() {
        assert!(CANCUN.is_enabled_in(BERLIN));
        assert!(BERLIN.is_enabled_in(BERLIN));
        assert!(!ISTANBUL.is_enabled_in(BERLIN));
    }

    #[test]
    fn names_match_discriminants() {
        for (i, (spec, name)) in NAMES.iter().enumerate() {
            assert_eq!(*spec as usize, i);
            assert_eq!(name.parse::<SpecId>(), Ok(*spec));
        }
        assert_eq!(NAMES.last().map(|(spec, _)| *spec), Some(SpecId::LATEST));
    }

    #[test]
    fn parsing_is_lenient_about_case_and_aliases() {
        assert_eq!("shanghai".parse::<SpecId>(), Ok(SHANGHAI));
        assert_eq!("Latest".parse::<SpecId>(), Ok(CANCUN));
        assert_eq!("PARIS".parse::<SpecId>(), Ok(MERGE));
        assert_eq!("Prague".parse::<SpecId>(), Err(UnknownHardfork));
        assert_eq!(SPURIOUS_DRAGON.to_string(), "SpuriousDragon");
    }
}
