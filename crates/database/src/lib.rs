//! Database implementations.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

pub use database_interface::*;

#[cfg(feature = "alloydb")]
mod alloydb;
pub mod in_memory_db;

#[cfg(feature = "alloydb")]
pub use alloydb::{AlloyDB, BlockId, ForkBlock, ForkFetchError};
pub use in_memory_db::*;
