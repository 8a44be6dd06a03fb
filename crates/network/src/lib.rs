// crates/network/src/lib.rs
//! Client side of the remote PDF text extraction service
//!
//! [`ProcessingService`] is the seam the library crate drives ingestion
//! through; [`RemoteClient`] implements it over HTTP.

mod client;
mod error;
mod service;

pub use client::{ClientConfig, RemoteClient};
pub use error::{NetworkError, NetworkResult};
pub use service::{PageRequest, PageResponse, ProcessingService, Registration, STATUS_SUCCESS};
