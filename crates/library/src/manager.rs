// FILE: crates/library/src/manager.rs

use crate::documents::DocumentCache;
use crate::error::Result;
use crate::import::BookImporter;
use crate::ingestion::{IngestionCoordinator, IngestionReport};
use crate::persistence::{FileStore, KeyValueStore};
use crate::store::LibraryStore;
use hearlearn_config::{Config, ConfigManager};
use hearlearn_core::{Book, BookId, LibraryStats};
use hearlearn_network::{ClientConfig, ProcessingService, RemoteClient};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// High-level library management
pub struct LibraryManager {
    store: Arc<LibraryStore>,
    coordinator: IngestionCoordinator,
    importer: BookImporter,
    documents: DocumentCache,
}

impl LibraryManager {
    /// Builds a manager from configuration: file storage under the data
    /// directory and the HTTP extraction service
    pub fn new(config: &Config, paths: &ConfigManager) -> Result<Self> {
        let data_dir = paths.data_dir(config);
        info!("Opening library in {}", data_dir.display());

        let client = RemoteClient::with_config(ClientConfig {
            base_url: config.remote.base_url.clone(),
            page_timeout: config.remote.page_timeout(),
            upload_timeout: config.remote.upload_timeout(),
            connect_timeout: config.remote.connect_timeout(),
            ..Default::default()
        })?;

        let store = LibraryStore::with_key(
            Arc::new(FileStore::new(data_dir)),
            config.library.storage_key.clone(),
        );

        Ok(Self::with_parts(
            Arc::new(store),
            Arc::new(client),
            DocumentCache::new(paths.documents_dir(config)),
            config.remote.page_timeout(),
            config.library.auto_process,
        ))
    }

    /// Assembles a manager from explicit parts
    pub fn with_parts(
        store: Arc<LibraryStore>,
        service: Arc<dyn ProcessingService>,
        documents: DocumentCache,
        page_timeout: Duration,
        auto_process: bool,
    ) -> Self {
        let coordinator = IngestionCoordinator::new(Arc::clone(&store), Arc::clone(&service))
            .with_page_timeout(page_timeout);

        let mut importer = BookImporter::new(service, Arc::clone(&store), documents.clone());
        if auto_process {
            importer = importer.with_coordinator(coordinator.clone());
        }

        Self {
            store,
            coordinator,
            importer,
            documents,
        }
    }

    /// Convenience constructor over any key-value backend
    pub fn with_backend(
        backend: Arc<dyn KeyValueStore>,
        service: Arc<dyn ProcessingService>,
        documents: DocumentCache,
    ) -> Self {
        Self::with_parts(
            Arc::new(LibraryStore::new(backend)),
            service,
            documents,
            crate::ingestion::DEFAULT_PAGE_TIMEOUT,
            true,
        )
    }

    pub fn store(&self) -> &Arc<LibraryStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &IngestionCoordinator {
        &self.coordinator
    }

    /// Import a PDF and queue it for ingestion
    pub async fn import_book<P: AsRef<Path>>(&self, path: P) -> Result<Book> {
        self.importer.import_file(path).await
    }

    /// Get all books in the library
    pub async fn list_books(&self) -> Vec<Book> {
        self.store.load_all().await
    }

    pub async fn get_book(&self, id: &BookId) -> Option<Book> {
        self.store.get(id).await
    }

    /// Removes a book and its cached document
    pub async fn remove_book(&self, id: &BookId) -> Result<()> {
        let local_uri = self.store.get(id).await.and_then(|book| book.local_uri);
        self.store.remove(id).await;

        if let Some(path) = local_uri {
            self.documents.discard(&path).await?;
        }
        Ok(())
    }

    /// Puts a failed book back in the queue
    pub async fn retry_book(&self, id: &BookId) -> bool {
        self.coordinator.retry(id).await
    }

    /// Ingests every processing book in the foreground
    pub async fn process_pending(&self) -> Vec<IngestionReport> {
        self.coordinator.run_until_idle().await
    }

    /// Starts the background ingestion worker
    pub fn start_processing(&self) -> JoinHandle<()> {
        self.coordinator.spawn_worker()
    }

    pub fn is_processing(&self) -> bool {
        self.coordinator.is_busy()
    }

    pub async fn record_session(&self, id: &BookId, page_index: u32, seconds: u64) {
        self.store.record_session(id, page_index, seconds).await
    }

    pub async fn set_bookmark(&self, id: &BookId, page_index: u32, present: bool) {
        self.store.set_bookmark(id, page_index, present).await
    }

    pub async fn set_annotation(&self, id: &BookId, page_index: u32, text: &str) {
        self.store.set_annotation(id, page_index, text).await
    }

    pub async fn get_stats(&self) -> LibraryStats {
        self.store.stats().await
    }

    /// Deletes the library record along with every cached document
    pub async fn clear(&self) {
        for book in self.store.load_all().await {
            if let Some(path) = book.local_uri {
                if let Err(e) = self.documents.discard(&path).await {
                    warn!("Could not remove {}: {}", path.display(), e);
                }
            }
        }
        self.store.clear().await;
    }
}
