//! Error types for the league store

use thiserror::Error;

/// Result type for league store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing league data
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A conditional write found the row in a different state
    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: &'static str, id: i64 },

    #[error("Invalid league data: {0}")]
    InvalidData(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }
}
