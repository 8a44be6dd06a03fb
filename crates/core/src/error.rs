//! Error types and recovery strategies for HearLearn
//!
//! This module provides a comprehensive error handling system with three severity tiers:
//! - **Recoverable**: Can be retried (network timeouts, a busy store, etc.)
//! - **Degraded**: Feature disabled but app continues (unreadable page payload, etc.)
//! - **Fatal**: Requires user intervention (unparseable configuration file)
//!
//! Each error includes a recovery action to guide the caller's handling.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the operation immediately (e.g., transient network glitch)
    RetryImmediate,
    /// Retry later (e.g., server temporarily unavailable)
    RetryWithBackoff,
    /// Disable the failing feature and continue
    DisableFeature,
    /// Reset local data to an empty state
    ResetLocalData,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryImmediate => write!(f, "Run the command again"),
            Self::RetryWithBackoff => write!(f, "Wait a moment, then try again"),
            Self::DisableFeature => write!(f, "Skip this document"),
            Self::ResetLocalData => write!(f, "Saved data will be replaced on the next write"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be recovered from by retrying
    Recoverable,
    /// Feature degraded but app can continue
    Degraded,
    /// Critical error requiring user action
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for HearLearn
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Network Errors =====
    /// Network request failed
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network timeout
    #[error("Network timeout after {seconds}s: {operation}")]
    NetworkTimeout { operation: String, seconds: u64 },

    /// The extraction service answered, but not with something usable
    #[error("Invalid response from extraction service: {details}")]
    InvalidServiceResponse { details: String },

    /// The extraction service refused the request
    #[error("Extraction service rejected request: HTTP {status}")]
    ServiceRejected { status: u16 },

    // ===== Storage Errors =====
    /// Local storage operation failed
    #[error("Storage error: {message}")]
    StorageError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Persisted library could not be decoded
    #[error("Library data corrupted: {details}")]
    StorageCorrupted { details: String },

    /// Record not found in the library
    #[error("Record not found: {entity} with {identifier}")]
    RecordNotFound { entity: String, identifier: String },

    // ===== File System Errors =====
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Permission denied for file operation
    #[error("Permission denied: {operation} on {path}")]
    PermissionDenied { operation: String, path: PathBuf },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration
    #[error("Invalid configuration: {setting} = '{value}' ({reason})")]
    InvalidConfiguration {
        setting: String,
        value: String,
        reason: String,
    },

    /// Configuration file corrupted
    #[error("Configuration corrupted: {path}")]
    ConfigurationCorrupted { path: PathBuf },

    // ===== Generic Errors =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NetworkError { .. }
            | Self::NetworkTimeout { .. }
            | Self::StorageError { .. } => ErrorSeverity::Recoverable,

            Self::InvalidServiceResponse { .. }
            | Self::ServiceRejected { .. }
            | Self::StorageCorrupted { .. }
            | Self::RecordNotFound { .. } => ErrorSeverity::Degraded,

            Self::ConfigurationCorrupted { .. } => ErrorSeverity::Fatal,

            // Context-dependent - default to degraded
            _ => ErrorSeverity::Degraded,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::NetworkTimeout { .. } => RecoveryAction::RetryImmediate,

            Self::NetworkError { .. } | Self::StorageError { .. } => {
                RecoveryAction::RetryWithBackoff
            }

            Self::StorageCorrupted { .. } => RecoveryAction::ResetLocalData,

            Self::InvalidServiceResponse { .. } => RecoveryAction::DisableFeature,

            // Default to user intervention for safety
            _ => RecoveryAction::UserIntervention,
        }
    }

    /// Returns a user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkError { .. } | Self::NetworkTimeout { .. } => {
                "Cannot reach the processing server. Please check your connection.".to_string()
            }
            Self::InvalidServiceResponse { .. } => {
                "The processing server sent data this app cannot read.".to_string()
            }
            Self::ServiceRejected { .. } => {
                "The processing server could not accept this PDF. Please try again.".to_string()
            }

            Self::StorageError { .. } => {
                "Your library is temporarily unavailable. Please try again.".to_string()
            }
            Self::StorageCorrupted { .. } => {
                "Your saved library could not be read and will start empty.".to_string()
            }
            Self::RecordNotFound { .. } => "The requested book was not found.".to_string(),

            Self::FileNotFound { .. } => {
                "The file was not found. It may have been moved or deleted.".to_string()
            }
            Self::PermissionDenied { .. } => {
                "Permission denied. Please check file access permissions.".to_string()
            }
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),

            Self::InvalidConfiguration { setting, .. } => {
                format!("Invalid setting: {}. Please check your configuration.", setting)
            }
            Self::ConfigurationCorrupted { path } => format!(
                "The settings file {} could not be read. Fix or delete it.",
                path.display()
            ),

            Self::InternalError { .. } => {
                "An unexpected error occurred. Please try again.".to_string()
            }
            Self::InvalidArgument { .. } => "Invalid input provided.".to_string(),
        }
    }

    /// Returns true if this error should be logged at ERROR level
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Returns true if this error can be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.recovery_action(),
            RecoveryAction::RetryImmediate | RecoveryAction::RetryWithBackoff
        )
    }

    /// Helper to create a network error from any error type
    pub fn network<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a storage error from any error type
    pub fn storage<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::StorageError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound {
                path: PathBuf::from("unknown"),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                operation: "file operation".to_string(),
                path: PathBuf::from("unknown"),
            },
            _ => Self::IoError {
                message: err.to_string(),
                source: err,
            },
        }
    }
}
