// FILE: crates/library/src/import.rs

use crate::documents::DocumentCache;
use crate::error::{LibraryError, Result};
use crate::ingestion::IngestionCoordinator;
use crate::store::LibraryStore;
use hearlearn_core::{Book, BookStatus};
use hearlearn_network::ProcessingService;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

/// Registers picked PDFs with the extraction service and queues them
pub struct BookImporter {
    service: Arc<dyn ProcessingService>,
    store: Arc<LibraryStore>,
    documents: DocumentCache,
    coordinator: Option<IngestionCoordinator>,
}

impl BookImporter {
    pub fn new(
        service: Arc<dyn ProcessingService>,
        store: Arc<LibraryStore>,
        documents: DocumentCache,
    ) -> Self {
        Self {
            service,
            store,
            documents,
            coordinator: None,
        }
    }

    /// Wakes `coordinator` after every successful import
    pub fn with_coordinator(mut self, coordinator: IngestionCoordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Imports one PDF
    ///
    /// Registration, copy and save failures are returned and leave the
    /// library untouched, with no cached copy left behind. On success the
    /// book is stored as `processing` with no pages.
    pub async fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<Book> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| LibraryError::FileNotFound(path.display().to_string()))?;
        if !metadata.is_file() {
            return Err(LibraryError::InvalidFile(format!(
                "{} is not a file",
                path.display()
            )));
        }

        let registration = self.service.start_processing(path).await?;
        let id = registration.id_arquivo.clone();
        let local_uri = self.documents.store(path, &id).await?;

        let patch = registration
            .into_patch()
            .with_local_uri(local_uri.clone())
            .with_status(BookStatus::Processing)
            .with_pages(Vec::new());
        self.store.upsert(patch).await;

        let Some(book) = self.store.get(&id).await else {
            if let Err(e) = self.documents.discard(&local_uri).await {
                warn!("Could not remove unsaved document {}: {}", local_uri.display(), e);
            }
            return Err(LibraryError::Storage(format!("book {} was not saved", id)));
        };

        info!("Imported {} as {}", book.name, book.id);
        if let Some(coordinator) = &self.coordinator {
            coordinator.wake();
        }
        Ok(book)
    }

    /// Imports several PDFs, stopping at the first failure
    pub async fn import_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<Book>> {
        let mut books = Vec::new();
        for path in paths {
            books.push(self.import_file(path).await?);
        }
        Ok(books)
    }
}
