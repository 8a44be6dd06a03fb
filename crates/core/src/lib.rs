pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use types::{
    Book, BookId, BookPatch, BookStatus, LibraryStats, ListeningTime, PageContent, Validator,
    Word, WordBox,
};
