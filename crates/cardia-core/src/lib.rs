//! cardia-core
//!
//! Pure domain types for the assessment history store: records, risk
//! results, identity normalization, and storage key conventions.
//! No storage dependency. This is the shared vocabulary of the Cardia crates.

pub mod error;
pub mod identity;
pub mod models;
pub mod storage_keys;
