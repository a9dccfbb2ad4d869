//! cardia-cli library root.
//!
//! Re-exports the config and command layers so integration tests can drive
//! them against an in-memory store without going through argument parsing.

pub mod commands;
pub mod config;
