//! Precompiles that expose native ledger operations to EVM callers.
//!
//! A call flows through [`setup::run_setup`] (selector lookup, read-only
//! enforcement, static gas check, argument decoding, ledger branch), then a
//! capability's [`dispatch::OperationHandler`] driven stage by stage, and
//! finally [`gas::GasAccountant::settle`]. The branch is written back only
//! when every stage succeeds.

pub mod abi;
pub mod authorization;
pub mod descriptor;
pub mod dispatch;
pub mod erc20;
pub mod error;
pub mod gas;
pub mod journal;
pub mod outpost;
pub mod setup;
pub mod vm;

#[cfg(test)]
mod testutil;

pub use dispatch::{Precompile, PrecompileOutput};
pub use error::{ErrorKind, PrecompileError};
