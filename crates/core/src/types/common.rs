//! Common types and utilities shared across domain models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Accumulated listening time, in whole seconds
///
/// Persisted as a plain number so records stay compatible with existing
/// library blobs. Only ever grows: there is no subtraction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ListeningTime(u64);

impl ListeningTime {
    /// Zero listening time constant
    pub const ZERO: Self = Self(0);

    /// Creates a listening time from seconds
    pub fn from_seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    /// Returns the listening time in seconds
    pub fn as_seconds(&self) -> u64 {
        self.0
    }

    /// Returns true if nothing has been listened to yet
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns this time extended by `seconds`, saturating at `u64::MAX`
    pub fn add_seconds(self, seconds: u64) -> Self {
        Self(self.0.saturating_add(seconds))
    }

    /// Formats as H:MM:SS (always shows hours)
    pub fn as_hms(&self) -> String {
        let total_seconds = self.0;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    }
}

impl fmt::Display for ListeningTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hms())
    }
}

impl From<std::time::Duration> for ListeningTime {
    fn from(d: std::time::Duration) -> Self {
        Self(d.as_secs())
    }
}

/// Trait for types that can validate themselves
pub trait Validator {
    /// Validates the instance and returns errors if invalid
    fn validate(&self) -> Result<(), Vec<String>>;

    /// Returns true if the instance is valid
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
