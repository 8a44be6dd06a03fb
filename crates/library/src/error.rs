// FILE: crates/library/src/error.rs

use hearlearn_config::ConfigError;
use hearlearn_core::error::AppError;
use hearlearn_network::NetworkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Extraction service error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

// Both type aliases for convenience
pub type Result<T> = std::result::Result<T, LibraryError>;
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::Network(e) => e.into(),
            LibraryError::Serialization(e) => AppError::StorageCorrupted {
                details: e.to_string(),
            },
            LibraryError::Storage(message) => AppError::StorageError {
                message,
                source: None,
            },
            LibraryError::FileNotFound(path) => AppError::FileNotFound { path: path.into() },
            LibraryError::BookNotFound(id) => AppError::RecordNotFound {
                entity: "book".to_string(),
                identifier: id,
            },
            LibraryError::InvalidFile(reason) => AppError::InvalidArgument {
                argument: "file".to_string(),
                reason,
            },
            LibraryError::Config(ConfigError::ParseError { path, .. }) => {
                AppError::ConfigurationCorrupted { path }
            }
            LibraryError::Config(e) => AppError::InternalError {
                message: e.to_string(),
            },
            LibraryError::Io(e) => e.into(),
            LibraryError::Other(message) => AppError::InternalError { message },
        }
    }
}
