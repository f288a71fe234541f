//! Cart store error taxonomy

use thiserror::Error;

use super::storage::StorageError;

/// Cart store errors
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Persistence task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid item: {0}")]
    InvalidItem(String),
}

pub type CartResult<T> = Result<T, CartError>;
