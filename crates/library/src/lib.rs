//! HearLearn Library Management
//!
//! Owns the persisted book collection and reconciles it with the remote
//! extraction service: books are imported as `processing`, ingested page by
//! page, and end up `ready` or `failed`. Reading state (position, listening
//! time, completion, bookmarks, annotations) lives on the same records.

pub mod documents;
pub mod error;
pub mod import;
pub mod ingestion;
pub mod manager;
pub mod persistence;
pub mod store;

pub use documents::DocumentCache;
pub use error::{LibraryError, LibraryResult};
pub use import::BookImporter;
pub use ingestion::{
    IngestionCoordinator, IngestionOutcome, IngestionReport, IngestionResult,
    DEFAULT_PAGE_TIMEOUT,
};
pub use manager::LibraryManager;
pub use persistence::{FileStore, KeyValueStore, MemoryStore};
pub use store::{LibraryStore, DEFAULT_STORAGE_KEY};
