//! Key-value error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KvError {
    #[error("Storage error: {0}")]
    Storage(#[from] medinexus_storage::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Value rejected by validator: {0}")]
    Rejected(String),
}
