//! # revsim-precompile
//!
//! Implementations of the precompiled contracts at `0x01..=0x04`.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

pub mod hash;
pub mod identity;
pub mod interface;
pub mod secp256k1;
pub mod utilities;

pub use interface::*;

use primitives::{hardfork::SpecId, Address, HashMap};

/// Linear cost: `base` plus `word` for every started 32-byte word of input.
pub fn calc_linear_cost_u32(len: usize, base: u64, word: u64) -> u64 {
    (len as u64).div_ceil(32) * word + base
}

/// Precompiles active in a hardfork, keyed by address.
#[derive(Clone, Default, Debug)]
pub struct Precompiles {
    inner: HashMap<Address, PrecompileFn>,
}

impl Precompiles {
    /// Returns the precompiles for the given spec.
    ///
    /// The four contracts exist since Frontier, so every spec gets the same set.
    pub fn new(_spec: SpecId) -> Self {
        let mut precompiles = Self::default();
        precompiles.extend([
            secp256k1::ECRECOVER,
            hash::SHA256,
            hash::RIPEMD160,
            identity::FUN,
        ]);
        precompiles
    }

    /// Returns an iterator over the precompile addresses.
    #[inline]
    pub fn addresses(&self) -> impl ExactSizeIterator<Item = &Address> {
        self.inner.keys()
    }

    /// Returns the precompile for the given address.
    #[inline]
    pub fn get(&self, address: &Address) -> Option<&PrecompileFn> {
        self.inner.get(address)
    }

    /// Extends the precompiles with the given precompiles.
    ///
    /// An address already present is replaced.
    #[inline]
    pub fn extend(&mut self, other: impl IntoIterator<Item = PrecompileWithAddress>) {
        self.inner
            .extend(other.into_iter().map(|PrecompileWithAddress(address, f)| (address, f)));
    }
}

/// A precompile function together with its address.
#[derive(Clone, Debug)]
pub struct PrecompileWithAddress(pub Address, pub PrecompileFn);

/// Address whose low 8 bytes are `x`, as used for the precompile addresses.
#[inline]
pub const fn u64_to_address(x: u64) -> Address {
    let x = x.to_be_bytes();
    Address::new([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7],
    ])
}
