// crates/network/src/client.rs
//! HTTP client for the extraction service

use crate::error::{NetworkError, NetworkResult};
use crate::service::{PageRequest, PageResponse, ProcessingService, Registration};
use async_trait::async_trait;
use hearlearn_core::{BookId, PageContent};
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, Url};
use std::path::Path;
use std::time::Duration;

const UPLOAD_PATH: &str = "iniciar_processamento";
const PAGE_PATH: &str = "obter_dados_pagina";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root, e.g. `https://back-and-learn-project.fly.dev`
    pub base_url: String,
    /// Bounded wait for a single page request
    pub page_timeout: Duration,
    /// Bounded wait for a document upload
    pub upload_timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://back-and-learn-project.fly.dev".to_string(),
            page_timeout: Duration::from_secs(60),
            upload_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("HearLearn/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for the given service root
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }
}

/// reqwest-backed [`ProcessingService`]
#[derive(Clone)]
pub struct RemoteClient {
    inner: ReqwestClient,
    base: Url,
    config: ClientConfig,
}

impl RemoteClient {
    /// Creates a client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let base = parse_base(&config.base_url)?;

        let inner = ReqwestClient::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self {
            inner,
            base,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> NetworkResult<Url> {
        self.base
            .join(path)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}{}: {}", self.base, path, e)))
    }

    async fn send(&self, request: RequestBuilder, timeout: Duration) -> NetworkResult<Response> {
        let response = request.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout(timeout)
            } else {
                NetworkError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn read_body(response: Response, timeout: Duration) -> NetworkResult<Vec<u8>> {
        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout(timeout)
            } else {
                NetworkError::Http(e)
            }
        })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ProcessingService for RemoteClient {
    async fn start_processing(&self, document: &Path) -> NetworkResult<Registration> {
        let bytes = tokio::fs::read(document).await?;
        let file_name = document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        info!("Uploading {} ({} bytes) for extraction", file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(UPLOAD_PATH)?;
        let timeout = self.config.upload_timeout;
        let response = self.send(self.inner.post(url).multipart(form), timeout).await?;
        let body = Self::read_body(response, timeout).await?;

        let registration: Registration = serde_json::from_slice(&body)
            .map_err(|e| NetworkError::InvalidResponse(format!("registration: {}", e)))?;

        info!(
            "Registered {} as {} with {} pages",
            registration.nome_original, registration.id_arquivo, registration.total_paginas
        );
        Ok(registration)
    }

    async fn fetch_page(&self, id: &BookId, page_number: u32) -> NetworkResult<PageContent> {
        debug!("Fetching page {} of {}", page_number, id);

        let url = self.endpoint(PAGE_PATH)?;
        let timeout = self.config.page_timeout;
        let request = self.inner.post(url).json(&PageRequest {
            id_arquivo: id,
            numero_pagina: page_number,
        });

        let response = self.send(request, timeout).await?;
        let body = Self::read_body(response, timeout).await?;

        let envelope: PageResponse = serde_json::from_slice(&body)
            .map_err(|e| NetworkError::InvalidResponse(format!("page {}: {}", page_number, e)))?;
        envelope.into_page(page_number)
    }
}

/// Parses the service root, making sure relative joins land under it
fn parse_base(base_url: &str) -> NetworkResult<Url> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };
    let url = Url::parse(&normalized)
        .map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(NetworkError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            base_url, other
        ))),
    }
}
