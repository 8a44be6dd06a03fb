// FILE: crates/library/src/store.rs
//! The persisted book collection
//!
//! Every operation is a read-modify-write of the whole collection, stored as
//! one JSON array under a single key. Public operations never fail: storage
//! and serialization problems are logged and the operation degrades to an
//! empty read or a no-op write. Callers that need certainty re-read.

use crate::error::LibraryResult;
use crate::persistence::KeyValueStore;
use hearlearn_core::{Book, BookId, BookPatch, LibraryStats, Validator};
use log::{debug, error, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default key the collection is stored under
pub const DEFAULT_STORAGE_KEY: &str = "@HearLearn:library";

/// Sole reader and writer of the persisted library
pub struct LibraryStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: Mutex<()>,
}

impl LibraryStore {
    /// Creates a store over the given backend using the default key
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Returns the persisted collection, or an empty one if nothing usable is stored
    pub async fn load_all(&self) -> Vec<Book> {
        match self.try_load().await {
            Ok(books) => books,
            Err(e) => {
                error!("Failed to load library '{}': {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Merges a patch into the book with the same id, or creates the book
    pub async fn upsert(&self, patch: BookPatch) {
        let id = patch.id.clone();
        if let Err(e) = self.try_upsert(patch).await {
            error!("Failed to save book {}: {}", id, e);
        }
    }

    /// Deletes a book. Removing an unknown id does nothing.
    pub async fn remove(&self, id: &BookId) {
        let result = self
            .try_mutate(|books| {
                let before = books.len();
                books.retain(|book| &book.id != id);
                books.len() != before
            })
            .await;

        if let Err(e) = result {
            error!("Failed to remove book {}: {}", id, e);
        }
    }

    /// Records the end of a reading session on a book
    pub async fn record_session(&self, id: &BookId, page_index: u32, seconds: u64) {
        let result = self
            .try_update(id, |book| {
                book.record_session(page_index, seconds);
                true
            })
            .await;

        if let Err(e) = result {
            error!("Failed to record session for book {}: {}", id, e);
        }
    }

    /// Adds or removes a bookmark
    pub async fn set_bookmark(&self, id: &BookId, page_index: u32, present: bool) {
        let result = self
            .try_update(id, |book| book.set_bookmark(page_index, present))
            .await;

        if let Err(e) = result {
            error!("Failed to update bookmark for book {}: {}", id, e);
        }
    }

    /// Stores a page note, or deletes it when the text is blank
    pub async fn set_annotation(&self, id: &BookId, page_index: u32, text: &str) {
        let result = self
            .try_update(id, |book| {
                let before = book.annotation(page_index).map(str::to_owned);
                book.set_annotation(page_index, text);
                before.as_deref() != book.annotation(page_index)
            })
            .await;

        if let Err(e) = result {
            error!("Failed to update annotation for book {}: {}", id, e);
        }
    }

    /// Deletes the persisted collection
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.backend.remove(&self.key).await {
            error!("Failed to clear library '{}': {}", self.key, e);
        }
    }

    pub async fn get(&self, id: &BookId) -> Option<Book> {
        self.load_all().await.into_iter().find(|book| &book.id == id)
    }

    /// First book still waiting for ingestion, in collection order
    pub async fn pending(&self) -> Option<Book> {
        self.load_all()
            .await
            .into_iter()
            .find(|book| book.is_processing())
    }

    pub async fn stats(&self) -> LibraryStats {
        LibraryStats::from_books(&self.load_all().await)
    }

    pub(crate) async fn try_load(&self) -> LibraryResult<Vec<Book>> {
        let Some(raw) = self.backend.get(&self.key).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(books) => Ok(books),
            Err(e) => {
                warn!("Library '{}' is unreadable, treating it as empty: {}", self.key, e);
                Ok(Vec::new())
            }
        }
    }

    pub(crate) async fn try_upsert(&self, patch: BookPatch) -> LibraryResult<bool> {
        self.try_mutate(move |books| {
            match books.iter_mut().find(|book| book.id == patch.id) {
                Some(book) => {
                    book.apply(patch);
                    warn_if_invalid(book);
                }
                None => {
                    let book = Book::from_patch(patch);
                    warn_if_invalid(&book);
                    books.push(book);
                }
            }
            true
        })
        .await
    }

    /// Applies `patch` only if the book exists and `guard` accepts it
    pub(crate) async fn try_upsert_if<G>(&self, patch: BookPatch, guard: G) -> LibraryResult<bool>
    where
        G: FnOnce(&Book) -> bool,
    {
        let id = patch.id.clone();
        self.try_update(&id, move |book| {
            if !guard(book) {
                return false;
            }
            book.apply(patch);
            warn_if_invalid(book);
            true
        })
        .await
    }

    /// Runs `update` on one book; absent books are left alone
    pub(crate) async fn try_update<F>(&self, id: &BookId, update: F) -> LibraryResult<bool>
    where
        F: FnOnce(&mut Book) -> bool,
    {
        self.try_mutate(|books| match books.iter_mut().find(|book| &book.id == id) {
            Some(book) => update(book),
            None => {
                debug!("Book {} not in library, nothing to update", id);
                false
            }
        })
        .await
    }

    /// One serialized read-modify-write cycle. `mutate` returns whether anything changed.
    async fn try_mutate<F>(&self, mutate: F) -> LibraryResult<bool>
    where
        F: FnOnce(&mut Vec<Book>) -> bool,
    {
        let _guard = self.write_lock.lock().await;

        let mut books = self.try_load().await?;
        if !mutate(&mut books) {
            return Ok(false);
        }

        let raw = serde_json::to_string(&books)?;
        self.backend.set(&self.key, &raw).await?;
        Ok(true)
    }
}

fn warn_if_invalid(book: &Book) {
    if let Err(problems) = book.validate() {
        warn!("Book {} saved with problems: {}", book.id, problems.join("; "));
    }
}
