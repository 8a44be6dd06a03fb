// crates/resilience/src/lib.rs
//! Resilience patterns for the ingestion pipeline
//!
//! This module provides:
//! - Bounded waits for async operations (`Timeout`, `with_timeout`)
//! - A single-slot gate that lets at most one run proceed (`SingleFlight`)
//!
//! # Example
//!
//! ```rust
//! use hearlearn_resilience::{SingleFlight, Timeout};
//! use std::time::Duration;
//!
//! let gate = SingleFlight::new("ingestion");
//! let timeout = Timeout::new(Duration::from_secs(60));
//!
//! let permit = gate.try_enter().expect("gate is idle");
//! assert!(gate.is_busy());
//! drop(permit);
//! assert_eq!(timeout.duration(), Duration::from_secs(60));
//! ```

mod error;
mod single_flight;
mod timeout;

pub use error::{ResilienceError, ResilienceResult};
pub use single_flight::{SingleFlight, SingleFlightPermit};
pub use timeout::{with_timeout, Timeout};
