//! Page content produced by remote ingestion
//!
//! Field names follow the extraction service's payload, which is also the
//! shape stored inside each book's `pagesData`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bounding box of a single word on the rendered page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl WordBox {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// A word of page text with its optional position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(rename = "texto", default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<WordBox>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full content of one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Complete page text, read aloud by the player
    #[serde(rename = "texto_completo", default)]
    pub text: String,

    /// True when the text came from OCR rather than the PDF text layer
    #[serde(rename = "extraido_por_ocr", default)]
    pub ocr: bool,

    /// Per-word coordinates, when the service could compute them
    #[serde(rename = "palavras", default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,

    /// Fields the client does not interpret but keeps
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageContent {
    /// Creates a text-only page
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Returns true if word coordinates are available for highlighting
    pub fn has_coordinates(&self) -> bool {
        self.words
            .as_ref()
            .is_some_and(|words| words.iter().any(|w| w.coords.is_some()))
    }

    /// Returns the coordinates of the word at `index`, if known
    pub fn word_box(&self, index: usize) -> Option<WordBox> {
        self.words.as_ref()?.get(index)?.coords
    }
}
