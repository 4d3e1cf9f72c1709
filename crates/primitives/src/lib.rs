//! # revsim-primitives
//!
//! Types shared by every revsim crate. Most of them are re-exported from `alloy-primitives`.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

pub mod constants;
pub mod eip4844;
pub mod hardfork;

pub use alloy_primitives::{
    self, address, b256, bytes, fixed_bytes, hex, keccak256,
    map::{self, hash_map, hash_set, HashMap, HashSet},
    ruint, uint, Address, Bytes, FixedBytes, Log, LogData, TxKind, B256, I256, U256,
};
pub use constants::*;

/// The Keccak-256 hash of the empty string `""`.
pub const KECCAK_EMPTY: B256 =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");
