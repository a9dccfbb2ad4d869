use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
