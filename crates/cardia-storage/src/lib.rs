//! cardia-storage
//!
//! The key-value storage port the history store is written against, and the
//! backends that implement it. Keys and values are plain strings; callers own
//! the encoding.

pub mod error;
pub mod file;
pub mod memory;
pub mod store;

pub use error::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::KeyValueStore;
