use crate::types::RecordId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown {kind} '{name}'")]
    UnknownField { kind: &'static str, name: String },

    #[error("Unknown {kind} value '{value}'")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Invalid page: pages start at 1, got {page}")]
    InvalidPage { page: usize },

    #[error("Invalid page size: must be greater than zero")]
    InvalidPageSize,

    #[error("Duplicate record id '{id}'")]
    DuplicateRecord { id: RecordId },

    #[error("Record '{id}' not found")]
    RecordNotFound { id: RecordId },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
