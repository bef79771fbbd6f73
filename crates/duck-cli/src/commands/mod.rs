//! CLI command implementations.

pub mod get;
pub mod keys;
pub mod remove;
pub mod set;
