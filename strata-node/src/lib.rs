//! Host for the Strata precompiles: configuration, genesis into an
//! in-memory ledger, and the `strata` command line.

pub mod call;
pub mod cli;
pub mod config;
pub mod error;
pub mod genesis;
pub mod ui;
