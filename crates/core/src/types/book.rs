//! Book domain model: identity, processing status and reading state

use crate::types::{ListeningTime, PageContent, Validator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Server-assigned identifier of an uploaded document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Wraps an identifier issued by the extraction service
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BookId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Processing status of a book
///
/// Statuses this client does not know are kept verbatim in `Other`
/// so they survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookStatus {
    /// Pages are still being retrieved
    Processing,
    /// All pages are available for playback
    #[default]
    Ready,
    /// Ingestion failed; waiting for a user retry
    Failed,
    Other(String),
}

impl BookStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for BookStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "processing" => Self::Processing,
            "ready" => Self::Ready,
            "failed" => Self::Failed,
            _ => Self::Other(s),
        }
    }
}

impl From<BookStatus> for String {
    fn from(status: BookStatus) -> Self {
        match status {
            BookStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An imported PDF together with its processing and reading state
///
/// Serialized field names match the persisted library layout, so
/// collections written by earlier clients load unchanged. Missing fields
/// take the same defaults a freshly created book gets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "id_arquivo")]
    pub id: BookId,

    #[serde(rename = "nome_original", default)]
    pub name: String,

    #[serde(rename = "total_paginas", default)]
    pub total_pages: u32,

    #[serde(default)]
    pub status: BookStatus,

    #[serde(rename = "pagesData", default)]
    pub pages: Vec<PageContent>,

    #[serde(rename = "localUri", default, skip_serializing_if = "Option::is_none")]
    pub local_uri: Option<PathBuf>,

    /// Zero-based index of the last page read
    #[serde(rename = "lastPosition", default)]
    pub last_position: u32,

    #[serde(rename = "listeningTime", default)]
    pub listening_time: ListeningTime,

    /// Sticky: once set it is never cleared
    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub bookmarks: BTreeSet<u32>,

    /// Notes keyed by page index; never holds blank notes
    #[serde(default, with = "page_keyed")]
    pub annotations: BTreeMap<u32, String>,

    /// Registration fields the client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Book {
    /// Persisted names of the fields modelled above; `extra` never holds these
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "id_arquivo",
        "nome_original",
        "total_paginas",
        "status",
        "pagesData",
        "localUri",
        "lastPosition",
        "listeningTime",
        "completed",
        "bookmarks",
        "annotations",
    ];

    /// Creates a book from a patch, defaulting every field the patch leaves unset
    pub fn from_patch(patch: BookPatch) -> Self {
        Self {
            id: patch.id,
            name: patch.name.unwrap_or_default(),
            total_pages: patch.total_pages.unwrap_or(0),
            status: patch.status.unwrap_or_default(),
            pages: patch.pages.unwrap_or_default(),
            local_uri: patch.local_uri,
            last_position: patch.last_position.unwrap_or(0),
            listening_time: patch.listening_time.unwrap_or_default(),
            completed: patch.completed.unwrap_or(false),
            bookmarks: patch.bookmarks.unwrap_or_default(),
            annotations: patch.annotations.unwrap_or_default(),
            extra: foreign_fields(patch.extra),
        }
    }

    /// Shallow-merges a patch: set fields overwrite, unset fields are kept
    pub fn apply(&mut self, patch: BookPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(total_pages) = patch.total_pages {
            self.total_pages = total_pages;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(pages) = patch.pages {
            self.pages = pages;
        }
        if let Some(local_uri) = patch.local_uri {
            self.local_uri = Some(local_uri);
        }
        if let Some(last_position) = patch.last_position {
            self.last_position = last_position;
        }
        if let Some(listening_time) = patch.listening_time {
            self.listening_time = listening_time;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(bookmarks) = patch.bookmarks {
            self.bookmarks = bookmarks;
        }
        if let Some(annotations) = patch.annotations {
            self.annotations = annotations;
        }
        self.extra.extend(foreign_fields(patch.extra));
    }

    /// Index of the final page
    pub fn last_page_index(&self) -> u32 {
        self.total_pages.saturating_sub(1)
    }

    pub fn is_processing(&self) -> bool {
        self.status == BookStatus::Processing
    }

    pub fn is_ready(&self) -> bool {
        self.status == BookStatus::Ready
    }

    pub fn is_failed(&self) -> bool {
        self.status == BookStatus::Failed
    }

    /// Records the end of a reading session
    ///
    /// Moves the reading position, adds the listened time and marks the book
    /// completed once the final page has been reached.
    pub fn record_session(&mut self, page_index: u32, seconds: u64) {
        self.last_position = page_index;
        self.listening_time = self.listening_time.add_seconds(seconds);
        self.completed = self.completed || page_index >= self.last_page_index();
    }

    /// Adds or removes a bookmark. Returns true if the set changed.
    pub fn set_bookmark(&mut self, page_index: u32, present: bool) -> bool {
        if present {
            self.bookmarks.insert(page_index)
        } else {
            self.bookmarks.remove(&page_index)
        }
    }

    pub fn is_bookmarked(&self, page_index: u32) -> bool {
        self.bookmarks.contains(&page_index)
    }

    /// Stores a note for a page, or deletes it when the text is blank
    pub fn set_annotation(&mut self, page_index: u32, text: &str) {
        if text.trim().is_empty() {
            self.annotations.remove(&page_index);
        } else {
            self.annotations.insert(page_index, text.to_string());
        }
    }

    pub fn annotation(&self, page_index: u32) -> Option<&str> {
        self.annotations.get(&page_index).map(String::as_str)
    }
}

impl Validator for Book {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id.as_str().trim().is_empty() {
            errors.push("Book id cannot be empty".to_string());
        }

        if self.name.trim().is_empty() {
            errors.push("Book name cannot be empty".to_string());
        }

        if self.is_ready() && !self.pages.is_empty() && self.pages.len() != self.total_pages as usize
        {
            errors.push(format!(
                "Book has {} pages of content but {} total pages",
                self.pages.len(),
                self.total_pages
            ));
        }

        if self.total_pages > 0 {
            if let Some(page) = self.bookmarks.iter().find(|p| **p >= self.total_pages) {
                errors.push(format!("Bookmark on page {} is out of range", page));
            }
            if let Some(page) = self.annotations.keys().find(|p| **p >= self.total_pages) {
                errors.push(format!("Annotation on page {} is out of range", page));
            }
        }

        if self.annotations.values().any(|note| note.trim().is_empty()) {
            errors.push("Annotations cannot be blank".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Drops keys that would collide with a modelled field once flattened
fn foreign_fields(extra: Map<String, Value>) -> Map<String, Value> {
    extra
        .into_iter()
        .filter(|(key, _)| !Book::FIELD_NAMES.contains(&key.as_str()))
        .collect()
}

/// Partial update of a book
///
/// `Some` fields overwrite the stored value; `None` fields are left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct BookPatch {
    pub id: BookId,
    pub name: Option<String>,
    pub total_pages: Option<u32>,
    pub status: Option<BookStatus>,
    pub pages: Option<Vec<PageContent>>,
    pub local_uri: Option<PathBuf>,
    pub last_position: Option<u32>,
    pub listening_time: Option<ListeningTime>,
    pub completed: Option<bool>,
    pub bookmarks: Option<BTreeSet<u32>>,
    pub annotations: Option<BTreeMap<u32, String>>,
    pub extra: Map<String, Value>,
}

impl BookPatch {
    /// Creates an empty patch for the given book
    pub fn new(id: BookId) -> Self {
        Self {
            id,
            name: None,
            total_pages: None,
            status: None,
            pages: None,
            local_uri: None,
            last_position: None,
            listening_time: None,
            completed: None,
            bookmarks: None,
            annotations: None,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_total_pages(mut self, total_pages: u32) -> Self {
        self.total_pages = Some(total_pages);
        self
    }

    pub fn with_status(mut self, status: BookStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_pages(mut self, pages: Vec<PageContent>) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_local_uri(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_uri = Some(path.into());
        self
    }

    pub fn with_last_position(mut self, page_index: u32) -> Self {
        self.last_position = Some(page_index);
        self
    }

    pub fn with_listening_time(mut self, time: ListeningTime) -> Self {
        self.listening_time = Some(time);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn with_bookmarks(mut self, bookmarks: impl IntoIterator<Item = u32>) -> Self {
        self.bookmarks = Some(bookmarks.into_iter().collect());
        self
    }

    pub fn with_annotations(mut self, annotations: BTreeMap<u32, String>) -> Self {
        self.annotations = Some(annotations);
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }
}

/// Annotations are stored as a JSON object, whose keys are strings
mod page_keyed {
    use log::warn;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(map: &BTreeMap<u32, String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(map.iter().map(|(page, note)| (page.to_string(), note)))
    }

    /// Keys that are not page numbers are dropped with a warning
    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<u32, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(key, note)| match key.trim().parse::<u32>() {
                Ok(page) => Some((page, note)),
                Err(_) => {
                    warn!("Skipping annotation with invalid page index '{}'", key);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_book(total_pages: u32) -> Book {
        Book::from_patch(
            BookPatch::new(BookId::new("file-1"))
                .with_name("Dom Casmurro.pdf")
                .with_total_pages(total_pages),
        )
    }

    #[test]
    fn test_status_roundtrip_strings() {
        assert_eq!(BookStatus::from("processing".to_string()), BookStatus::Processing);
        assert_eq!(BookStatus::from("ready".to_string()), BookStatus::Ready);
        assert_eq!(BookStatus::from("failed".to_string()), BookStatus::Failed);
        assert_eq!(
            BookStatus::from("queued".to_string()),
            BookStatus::Other("queued".to_string())
        );
        assert_eq!(String::from(BookStatus::Other("queued".to_string())), "queued");
    }

    #[test]
    fn test_from_patch_applies_defaults() {
        let book = sample_book(10);

        assert_eq!(book.status, BookStatus::Ready);
        assert_eq!(book.last_position, 0);
        assert!(book.listening_time.is_zero());
        assert!(!book.completed);
        assert!(book.bookmarks.is_empty());
        assert!(book.annotations.is_empty());
        assert!(book.local_uri.is_none());
    }

    #[test]
    fn test_from_patch_keeps_provided_fields() {
        let book = Book::from_patch(
            BookPatch::new(BookId::new("x"))
                .with_status(BookStatus::Processing)
                .with_last_position(4)
                .with_bookmarks([3, 1, 3]),
        );

        assert_eq!(book.status, BookStatus::Processing);
        assert_eq!(book.last_position, 4);
        assert_eq!(book.bookmarks.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_apply_preserves_unset_fields() {
        let mut book = sample_book(10);
        book.record_session(3, 60);

        book.apply(BookPatch::new(book.id.clone()).with_status(BookStatus::Failed));

        assert_eq!(book.status, BookStatus::Failed);
        assert_eq!(book.name, "Dom Casmurro.pdf");
        assert_eq!(book.last_position, 3);
        assert_eq!(book.listening_time.as_seconds(), 60);
    }

    #[test]
    fn test_record_session_completion_is_sticky() {
        let mut book = sample_book(3);

        book.record_session(1, 10);
        assert!(!book.completed);

        book.record_session(2, 10);
        assert!(book.completed);

        book.record_session(0, 5);
        assert!(book.completed);
        assert_eq!(book.last_position, 0);
        assert_eq!(book.listening_time.as_seconds(), 25);
    }

    #[test]
    fn test_record_session_without_pages_completes() {
        let mut book = sample_book(0);
        book.record_session(0, 0);
        assert!(book.completed);
    }

    #[test]
    fn test_bookmarks_stay_sorted_and_unique() {
        let mut book = sample_book(10);
        assert!(book.set_bookmark(5, true));
        assert!(!book.set_bookmark(5, true));
        assert!(book.set_bookmark(2, true));

        assert_eq!(book.bookmarks.iter().copied().collect::<Vec<_>>(), vec![2, 5]);
        assert!(book.set_bookmark(5, false));
        assert!(!book.set_bookmark(5, false));
        assert!(!book.is_bookmarked(5));
    }

    #[test]
    fn test_blank_annotation_removes_entry() {
        let mut book = sample_book(10);
        book.set_annotation(2, "a note");
        assert_eq!(book.annotation(2), Some("a note"));

        book.set_annotation(2, "   ");
        assert_eq!(book.annotation(2), None);
        assert!(book.annotations.is_empty());
    }

    #[test]
    fn test_deserialize_persisted_record() {
        let book: Book = serde_json::from_value(json!({
            "id_arquivo": "abc123",
            "nome_original": "livro.pdf",
            "total_paginas": 2,
            "status": "ready",
            "pagesData": [{"texto_completo": "um"}, {"texto_completo": "dois"}],
            "localUri": "/data/abc123.pdf",
            "lastPosition": 1,
            "listeningTime": 95,
            "completed": true,
            "bookmarks": [0, 1],
            "annotations": {"1": "fim"},
            "mensagem": "ok"
        }))
        .unwrap();

        assert_eq!(book.id.as_str(), "abc123");
        assert_eq!(book.pages.len(), 2);
        assert_eq!(book.local_uri, Some(PathBuf::from("/data/abc123.pdf")));
        assert_eq!(book.annotation(1), Some("fim"));
        assert_eq!(book.extra.get("mensagem"), Some(&json!("ok")));
        assert!(book.is_valid());
    }

    #[test]
    fn test_deserialize_minimal_record_uses_defaults() {
        let book: Book = serde_json::from_value(json!({"id_arquivo": "abc"})).unwrap();
        assert_eq!(book.status, BookStatus::Ready);
        assert_eq!(book.last_position, 0);
        assert!(book.annotations.is_empty());
    }

    #[test]
    fn test_serialized_annotation_keys_are_strings() {
        let mut book = sample_book(10);
        book.set_annotation(7, "note");
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["annotations"], json!({"7": "note"}));
        assert_eq!(value["id_arquivo"], json!("file-1"));
    }

    #[test]
    fn test_invalid_annotation_key_is_skipped() {
        let book: Book = serde_json::from_value(json!({
            "id_arquivo": "abc",
            "annotations": {"first": "oops", "2": "kept"}
        }))
        .unwrap();
        assert_eq!(book.annotations.len(), 1);
        assert_eq!(book.annotation(2), Some("kept"));
    }

    #[test]
    fn test_extra_never_shadows_modelled_fields() {
        let mut extra = Map::new();
        extra.insert("status".to_string(), json!("sucesso"));
        extra.insert("pagesData".to_string(), json!([]));
        extra.insert("tamanho_bytes".to_string(), json!(10));

        let mut book = Book::from_patch(
            BookPatch::new(BookId::new("abc"))
                .with_name("a.pdf")
                .with_status(BookStatus::Processing)
                .with_extra(extra.clone()),
        );
        book.apply(BookPatch::new(book.id.clone()).with_extra(extra));

        assert_eq!(book.extra.len(), 1);
        assert_eq!(book.status, BookStatus::Processing);

        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["status"], json!("processing"));
        let reloaded: Book = serde_json::from_value(value).unwrap();
        assert_eq!(reloaded, book);
    }

    #[test]
    fn test_validation_page_count_mismatch() {
        let mut book = sample_book(3);
        book.pages = vec![PageContent::from_text("only one")];
        assert!(!book.is_valid());
    }

    #[test]
    fn test_validation_bookmark_out_of_range() {
        let mut book = sample_book(3);
        book.set_bookmark(3, true);
        assert!(!book.is_valid());
    }

    #[test]
    fn test_validation_empty_name() {
        let book = Book::from_patch(BookPatch::new(BookId::new("x")));
        assert!(!book.is_valid());
    }
}
