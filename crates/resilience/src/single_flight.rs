// crates/resilience/src/single_flight.rs
//! Single-slot gate: at most one run at a time, no queue

use crate::error::{ResilienceError, ResilienceResult};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Gate that admits one holder at a time
///
/// Callers that find the gate taken are turned away rather than queued;
/// they are expected to come back when the current holder is done.
#[derive(Debug, Clone)]
pub struct SingleFlight {
    name: String,
    slot: Arc<Semaphore>,
}

/// Proof of holding the gate; the slot is released on drop
#[derive(Debug)]
pub struct SingleFlightPermit {
    _permit: OwnedSemaphorePermit,
}

impl SingleFlight {
    /// Creates an idle gate
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Name used in errors and logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Takes the slot if it is free
    pub fn try_enter(&self) -> ResilienceResult<SingleFlightPermit> {
        match Arc::clone(&self.slot).try_acquire_owned() {
            Ok(permit) => Ok(SingleFlightPermit { _permit: permit }),
            Err(_) => {
                log::debug!("{} gate is busy", self.name);
                Err(ResilienceError::Busy(self.name.clone()))
            }
        }
    }

    /// Returns true while some holder has the slot
    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }
}
