//! # revsim-handler
//!
//! Runs a transaction: validation, pre execution, the call frame loop and post execution.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

mod evm;
pub mod frame;
pub mod post_execution;
pub mod pre_execution;
pub mod validation;

pub use evm::MainnetEvm;
pub use frame::{Frame, FrameData, FrameInput, FrameResult, ItemOrResult};
