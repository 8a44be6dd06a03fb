//! Extraction service configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the PDF extraction service lives and how long to wait for it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the extraction service
    pub base_url: String,

    /// Bounded wait for a single page request
    pub page_timeout_secs: u64,

    /// Bounded wait for the initial upload
    pub upload_timeout_secs: u64,

    /// Bounded wait for establishing a connection
    pub connect_timeout_secs: u64,
}

impl RemoteConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://back-and-learn-project.fly.dev".to_string(),
            page_timeout_secs: 60,
            upload_timeout_secs: 300,
            connect_timeout_secs: 10,
        }
    }
}

impl ConfigSection for RemoteConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let results = vec![
            Validator::http_url(&self.base_url, "remote.base_url"),
            Validator::in_range(self.page_timeout_secs, 1, 600, "remote.page_timeout_secs"),
            Validator::in_range(
                self.upload_timeout_secs,
                1,
                3600,
                "remote.upload_timeout_secs",
            ),
            Validator::in_range(
                self.connect_timeout_secs,
                1,
                120,
                "remote.connect_timeout_secs",
            ),
        ];

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.base_url = other.base_url;
        self.page_timeout_secs = other.page_timeout_secs;
        self.upload_timeout_secs = other.upload_timeout_secs;
        self.connect_timeout_secs = other.connect_timeout_secs;
    }

    fn section_name(&self) -> &'static str {
        "remote"
    }
}
