//! cardia-history
//!
//! Per-identity assessment history on top of a [`KeyValueStore`]: identity
//! bookkeeping, CRUD over each identity's partition, one-time migration from
//! legacy key schemes, and the repair and diagnostic tools used when the key
//! scheme drifts.
//!
//! Storage is treated as unreliable. The plain operations never return
//! errors; failures are logged and surface as empty or neutral results. The
//! `try_*` variants report them instead.
//!
//! [`KeyValueStore`]: cardia_storage::KeyValueStore

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod migrate;
mod partition;
pub mod repair;
pub mod store;

pub use config::HistoryConfig;
pub use error::HistoryError;
pub use store::AssessmentHistoryStore;
