// ABOUTME: Error types for the storage package

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checkpoint index {0} out of range")]
    CheckpointOutOfRange(usize),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
