use cardia_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("corrupt partition {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("write conflict on {key} after {attempts} attempts")]
    Conflict { key: String, attempts: u32 },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
