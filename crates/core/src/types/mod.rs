//! Domain types for HearLearn
//!
//! This module contains all domain models organized by responsibility:
//! - `book`: Book identity, processing status and reading state
//! - `page`: Per-page text and word coordinates delivered by ingestion
//! - `stats`: Library statistics
//! - `common`: Shared traits and utilities

mod book;
mod common;
mod page;
mod stats;

// Re-export all public types
pub use book::{Book, BookId, BookPatch, BookStatus};
pub use common::{ListeningTime, Validator};
pub use page::{PageContent, Word, WordBox};
pub use stats::LibraryStats;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let id = BookId::new("abc");
        let _patch: BookPatch = BookPatch::new(id.clone());
        let _status: BookStatus = BookStatus::default();
        let _page: PageContent = PageContent::default();
        let _stats: LibraryStats = LibraryStats::from_books(&[]);
    }

    #[test]
    fn test_listening_time_formatting() {
        let t = ListeningTime::from_seconds(3665); // 1h 1m 5s
        assert!(t.to_string().contains("1:01:05"));
    }
}
