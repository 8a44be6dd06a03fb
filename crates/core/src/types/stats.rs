//! Library statistics

use crate::types::{Book, BookStatus, ListeningTime};
use serde::{Deserialize, Serialize};

/// Library-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_books: usize,
    pub ready_count: usize,
    pub processing_count: usize,
    pub failed_count: usize,
    pub completed_count: usize,
    pub total_pages: u64,
    pub total_bookmarks: usize,
    pub total_annotations: usize,
    pub total_listening_time: ListeningTime,
}

impl LibraryStats {
    /// Computes statistics over a collection of books
    pub fn from_books(books: &[Book]) -> Self {
        let mut stats = Self {
            total_books: books.len(),
            ..Default::default()
        };

        for book in books {
            match book.status {
                BookStatus::Ready => stats.ready_count += 1,
                BookStatus::Processing => stats.processing_count += 1,
                BookStatus::Failed => stats.failed_count += 1,
                BookStatus::Other(_) => {}
            }
            if book.completed {
                stats.completed_count += 1;
            }
            stats.total_pages += u64::from(book.total_pages);
            stats.total_bookmarks += book.bookmarks.len();
            stats.total_annotations += book.annotations.len();
            stats.total_listening_time = stats
                .total_listening_time
                .add_seconds(book.listening_time.as_seconds());
        }

        stats
    }

    /// Returns the percentage of completed books
    pub fn completed_percentage(&self) -> f64 {
        if self.total_books == 0 {
            return 0.0;
        }
        (self.completed_count as f64 / self.total_books as f64) * 100.0
    }

    /// Returns the average listening time per book
    pub fn average_listening_time(&self) -> ListeningTime {
        if self.total_books == 0 {
            return ListeningTime::ZERO;
        }
        ListeningTime::from_seconds(self.total_listening_time.as_seconds() / self.total_books as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookId, BookPatch};

    fn book(id: &str, status: BookStatus, pages: u32) -> Book {
        Book::from_patch(
            BookPatch::new(BookId::new(id))
                .with_name(id)
                .with_total_pages(pages)
                .with_status(status),
        )
    }

    #[test]
    fn test_empty_stats() {
        let stats = LibraryStats::from_books(&[]);
        assert_eq!(stats.total_books, 0);
        assert_eq!(stats.completed_percentage(), 0.0);
        assert!(stats.average_listening_time().is_zero());
    }

    #[test]
    fn test_counts_by_status() {
        let mut finished = book("a", BookStatus::Ready, 2);
        finished.record_session(1, 120);
        finished.set_bookmark(0, true);
        finished.set_annotation(1, "end");

        let books = vec![
            finished,
            book("b", BookStatus::Processing, 5),
            book("c", BookStatus::Failed, 3),
            book("d", BookStatus::Other("queued".to_string()), 1),
        ];

        let stats = LibraryStats::from_books(&books);
        assert_eq!(stats.total_books, 4);
        assert_eq!(stats.ready_count, 1);
        assert_eq!(stats.processing_count, 1);
        assert_eq!(stats.failed_count, 1);
        assert_eq!(stats.completed_count, 1);
        assert_eq!(stats.total_pages, 11);
        assert_eq!(stats.total_bookmarks, 1);
        assert_eq!(stats.total_annotations, 1);
        assert_eq!(stats.total_listening_time.as_seconds(), 120);
        assert_eq!(stats.completed_percentage(), 25.0);
        assert_eq!(stats.average_listening_time().as_seconds(), 30);
    }
}
