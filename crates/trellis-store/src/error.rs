//! Error types for trellis-store

use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Invalid pagination cursor: {0}")]
    InvalidCursor(String),

    #[error("Field is not a number: {0}")]
    NotANumber(String),

    #[error("Data must be a JSON object")]
    NotAnObject,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
