// FILE: crates/library/src/ingestion.rs
//! Page-by-page ingestion of processing books
//!
//! A run picks the first `processing` book, fetches pages `1..=total_pages`
//! strictly in order and writes either the full page list with status
//! `ready`, or status `failed` with no pages. Only one run is active at a
//! time; a caller that finds the slot taken gets [`IngestionOutcome::Busy`]
//! and the backlog is picked up by the next idle check.

use crate::store::LibraryStore;
use hearlearn_core::{Book, BookId, BookPatch, BookStatus, PageContent};
use hearlearn_network::{NetworkError, ProcessingService};
use hearlearn_resilience::{SingleFlight, Timeout};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Default bounded wait for one page
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of one ingestion attempt
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionOutcome {
    /// Another run holds the slot
    Busy,
    /// No book is waiting
    Idle,
    Finished(IngestionReport),
}

/// How a finished run ended
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionResult {
    Ready { pages: u32 },
    Failed { page: u32, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestionReport {
    pub book_id: BookId,
    pub name: String,
    pub result: IngestionResult,
    /// False when the final state could not be written and the book is still processing
    pub persisted: bool,
    pub elapsed: Duration,
}

impl IngestionReport {
    pub fn is_ready(&self) -> bool {
        matches!(self.result, IngestionResult::Ready { .. })
    }
}

struct PageFailure {
    page: u32,
    error: NetworkError,
}

/// Drives processing books to `ready` or `failed`
#[derive(Clone)]
pub struct IngestionCoordinator {
    store: Arc<LibraryStore>,
    service: Arc<dyn ProcessingService>,
    gate: SingleFlight,
    page_timeout: Timeout,
    wakeup: Arc<Notify>,
}

impl IngestionCoordinator {
    pub fn new(store: Arc<LibraryStore>, service: Arc<dyn ProcessingService>) -> Self {
        Self {
            store,
            service,
            gate: SingleFlight::new("ingestion"),
            page_timeout: Timeout::new(DEFAULT_PAGE_TIMEOUT),
            wakeup: Arc::new(Notify::new()),
        }
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = Timeout::new(timeout);
        self
    }

    pub fn store(&self) -> &Arc<LibraryStore> {
        &self.store
    }

    pub fn service(&self) -> &Arc<dyn ProcessingService> {
        &self.service
    }

    /// True while a run holds the slot
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Ingests the first processing book, if the slot is free
    pub async fn process_next(&self) -> IngestionOutcome {
        let Ok(_permit) = self.gate.try_enter() else {
            return IngestionOutcome::Busy;
        };

        match self.store.pending().await {
            Some(book) => IngestionOutcome::Finished(self.ingest(book).await),
            None => IngestionOutcome::Idle,
        }
    }

    /// Keeps ingesting until nothing is pending or another run takes over
    pub async fn run_until_idle(&self) -> Vec<IngestionReport> {
        let mut reports = Vec::new();

        loop {
            match self.process_next().await {
                IngestionOutcome::Finished(report) => {
                    let persisted = report.persisted;
                    reports.push(report);
                    if !persisted {
                        // The book is still processing; going on would fetch it again.
                        break;
                    }
                }
                IngestionOutcome::Idle | IngestionOutcome::Busy => break,
            }
        }

        reports
    }

    /// Resets a failed book to processing so the next run starts it over
    ///
    /// Returns false if the book is missing, not failed, or the write failed.
    pub async fn retry(&self, id: &BookId) -> bool {
        let result = self
            .store
            .try_update(id, |book| {
                if !book.is_failed() {
                    return false;
                }
                book.status = BookStatus::Processing;
                book.pages.clear();
                true
            })
            .await;

        match result {
            Ok(true) => {
                info!("Book {} queued for another attempt", id);
                self.wake();
                true
            }
            Ok(false) => {
                debug!("Book {} is not failed, nothing to retry", id);
                false
            }
            Err(e) => {
                error!("Failed to reset book {} for retry: {}", id, e);
                false
            }
        }
    }

    /// Signals the background worker that there may be work
    pub fn wake(&self) {
        self.wakeup.notify_one();
    }

    /// Spawns a task that drains the backlog now and after every [`wake`](Self::wake)
    ///
    /// The task runs until the handle is aborted.
    pub fn spawn_worker(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            loop {
                let reports = coordinator.run_until_idle().await;
                if !reports.is_empty() {
                    debug!("Ingestion worker finished {} book(s)", reports.len());
                }
                coordinator.wakeup.notified().await;
            }
        })
    }

    async fn ingest(&self, book: Book) -> IngestionReport {
        info!(
            "Starting ingestion of {} ({}, {} pages)",
            book.name, book.id, book.total_pages
        );
        let started = Instant::now();

        let (patch, result) = match self.fetch_all(&book).await {
            Ok(pages) => {
                let count = pages.len() as u32;
                info!("Book {} ready with {} pages", book.id, count);
                (
                    BookPatch::new(book.id.clone())
                        .with_pages(pages)
                        .with_status(BookStatus::Ready),
                    IngestionResult::Ready { pages: count },
                )
            }
            Err(failure) => {
                warn!(
                    "Ingestion of {} failed at page {}: {}",
                    book.id, failure.page, failure.error
                );
                (
                    BookPatch::new(book.id.clone())
                        .with_pages(Vec::new())
                        .with_status(BookStatus::Failed),
                    IngestionResult::Failed {
                        page: failure.page,
                        reason: failure.error.to_string(),
                    },
                )
            }
        };

        let persisted = self.commit(patch).await;

        IngestionReport {
            book_id: book.id,
            name: book.name,
            result,
            persisted,
            elapsed: started.elapsed(),
        }
    }

    async fn fetch_all(&self, book: &Book) -> Result<Vec<PageContent>, PageFailure> {
        let mut pages = Vec::with_capacity(book.total_pages as usize);

        for number in 1..=book.total_pages {
            debug!("Fetching page {}/{} of {}", number, book.total_pages, book.id);

            let fetched = match self
                .page_timeout
                .execute(self.service.fetch_page(&book.id, number))
                .await
            {
                Ok(result) => result,
                Err(e) => Err(NetworkError::from(e)),
            };

            match fetched {
                Ok(page) => pages.push(page),
                Err(error) => return Err(PageFailure { page: number, error }),
            }
        }

        Ok(pages)
    }

    /// Writes the final state, unless the book left `processing` meanwhile
    async fn commit(&self, patch: BookPatch) -> bool {
        let id = patch.id.clone();
        match self.store.try_upsert_if(patch, Book::is_processing).await {
            Ok(true) => true,
            Ok(false) => {
                warn!("Book {} was removed or changed during ingestion, result dropped", id);
                true
            }
            Err(e) => {
                error!("Failed to save ingestion result for {}: {}", id, e);
                false
            }
        }
    }
}
