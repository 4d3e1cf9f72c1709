//! Commands of the `revsim` binary.
pub mod cmd;
