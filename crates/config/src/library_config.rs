//! Local library configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the library record and cached documents are kept
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    /// Key under which the whole collection is stored
    pub storage_key: String,

    /// Cached PDF directory (relative to the data dir if not absolute)
    pub documents_dir: PathBuf,

    /// Start ingestion in the background right after an import
    pub auto_process: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            storage_key: "@HearLearn:library".to_string(),
            documents_dir: PathBuf::from("documents"),
            auto_process: true,
        }
    }
}

impl ConfigSection for LibraryConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let results = vec![
            Validator::not_empty(&self.storage_key, "library.storage_key"),
            Validator::not_empty(
                &self.documents_dir.to_string_lossy(),
                "library.documents_dir",
            ),
        ];

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.storage_key = other.storage_key;
        self.documents_dir = other.documents_dir;
        self.auto_process = other.auto_process;
    }

    fn section_name(&self) -> &'static str {
        "library"
    }
}
