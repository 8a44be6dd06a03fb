// crates/network/src/service.rs
//! The extraction service seam and its wire records

use crate::error::{NetworkError, NetworkResult};
use async_trait::async_trait;
use hearlearn_core::{BookId, BookPatch, PageContent};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Success marker the service puts in `status`
pub const STATUS_SUCCESS: &str = "sucesso";

/// Remote PDF text extraction
///
/// Page numbers on this seam are one-based, as the service counts them.
#[async_trait]
pub trait ProcessingService: Send + Sync {
    /// Uploads a document and registers it for extraction
    async fn start_processing(&self, document: &Path) -> NetworkResult<Registration>;

    /// Retrieves the extracted content of one page
    async fn fetch_page(&self, id: &BookId, page_number: u32) -> NetworkResult<PageContent>;
}

/// The service's answer to an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id_arquivo: BookId,
    #[serde(default)]
    pub nome_original: String,
    #[serde(default)]
    pub total_paginas: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Registration {
    /// Converts the registration into a patch carrying every delivered field
    pub fn into_patch(self) -> BookPatch {
        BookPatch::new(self.id_arquivo)
            .with_name(self.nome_original)
            .with_total_pages(self.total_paginas)
            .with_extra(self.extra)
    }
}

/// Body of a page request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRequest<'a> {
    pub id_arquivo: &'a BookId,
    pub numero_pagina: u32,
}

/// Envelope around a page payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub dados: Option<PageContent>,
}

impl PageResponse {
    /// Unwraps the payload, rejecting anything without an explicit success marker
    pub fn into_page(self, page_number: u32) -> NetworkResult<PageContent> {
        if self.status != STATUS_SUCCESS {
            return Err(NetworkError::InvalidResponse(format!(
                "page {} returned status '{}'",
                page_number, self.status
            )));
        }
        self.dados.ok_or_else(|| {
            NetworkError::InvalidResponse(format!("page {} has no payload", page_number))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearlearn_core::Book;
    use serde_json::json;

    #[test]
    fn test_registration_keeps_unknown_fields() {
        let registration: Registration = serde_json::from_value(json!({
            "id_arquivo": "abc",
            "nome_original": "paper.pdf",
            "total_paginas": 3,
            "tamanho_bytes": 1024
        }))
        .unwrap();

        let book = Book::from_patch(registration.into_patch());
        assert_eq!(book.id.as_str(), "abc");
        assert_eq!(book.name, "paper.pdf");
        assert_eq!(book.total_pages, 3);
        assert_eq!(book.extra.get("tamanho_bytes"), Some(&json!(1024)));
    }

    #[test]
    fn test_page_request_wire_names() {
        let id = BookId::new("abc");
        let body = serde_json::to_value(PageRequest {
            id_arquivo: &id,
            numero_pagina: 2,
        })
        .unwrap();
        assert_eq!(body, json!({"id_arquivo": "abc", "numero_pagina": 2}));
    }

    #[test]
    fn test_successful_page_response() {
        let response: PageResponse = serde_json::from_value(json!({
            "status": "sucesso",
            "dados": {
                "texto_completo": "Hello world",
                "extraido_por_ocr": true,
                "palavras": [{"texto": "Hello", "coords": {"x0": 1.0, "y0": 2.0, "x1": 3.0, "y1": 4.0}}]
            }
        }))
        .unwrap();

        let page = response.into_page(1).unwrap();
        assert_eq!(page.text, "Hello world");
        assert!(page.ocr);
        assert!(page.has_coordinates());
    }

    #[test]
    fn test_non_success_status_is_rejected() {
        let response: PageResponse = serde_json::from_value(json!({
            "status": "erro",
            "dados": {"texto_completo": "ignored"}
        }))
        .unwrap();

        let err = response.into_page(4).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidResponse(_)));
        assert!(err.to_string().contains("page 4"));
    }

    #[test]
    fn test_missing_payload_is_rejected() {
        let response: PageResponse = serde_json::from_value(json!({"status": "sucesso"})).unwrap();
        assert!(response.into_page(1).is_err());
    }

    #[test]
    fn test_missing_status_is_rejected() {
        let response: PageResponse =
            serde_json::from_value(json!({"dados": {"texto_completo": "x"}})).unwrap();
        assert!(response.into_page(1).is_err());
    }
}
