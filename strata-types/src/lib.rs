//! Shared type definitions for the Strata precompile bridge.

pub mod constants;
pub mod error;
pub mod primitives;
pub mod token;
