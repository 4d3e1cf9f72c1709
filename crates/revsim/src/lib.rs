//! # revsim
//!
//! Deterministic EVM simulation: run calls and deployments against an in-memory account store,
//! optionally forked from a JSON-RPC node, with snapshots and EIP-3155 tracing.
//!
//! The building blocks are re-exported as modules; [`Evm`] ties them together.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod backend;
mod error;
mod evm;
mod opts;

pub use backend::{Backend, BackendError, EvmDb};
pub use error::CallError;
pub use evm::Evm;
pub use opts::EvmOpts;

// Export subcrates.
pub use bytecode;
pub use context;
pub use database;
pub use handler;
pub use inspector;
pub use precompile;
pub use primitives;
pub use state;
