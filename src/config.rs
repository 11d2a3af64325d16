use std::path::Path;
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

/// Met Museum public collection objects endpoint.
pub const MET_OBJECTS_URL: &str =
    "https://collectionapi.metmuseum.org/public/collection/v1/objects";

/// Highest valid object id, per the collection API documentation.
pub const MET_CATALOG_SIZE: u64 = 471_581;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Time between display swaps.
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,
    /// Countdown value (seconds remaining) at which the next prefetch starts.
    pub refresh_threshold: u64,
    /// Prefer the full-resolution primary image over the small variant.
    pub primary_image_preferred: bool,
    /// Base URL of the collection objects endpoint.
    pub api_base_url: String,
    /// Upper bound of the random object id range.
    pub max_object_id: u64,
    /// Retry budget for a single prefetch pass.
    pub max_retry: u32,
    /// Optional per-request timeout. Transport default when absent.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults
    /// alone. Runs before any network activity.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.refresh_interval >= Duration::from_secs(1),
            "refresh-interval must be at least 1 second"
        );
        ensure!(
            self.refresh_threshold >= 1,
            "refresh-threshold must be at least 1"
        );
        // The prefetch must start strictly before the swap tick, or there is
        // no window left for the fetch to complete.
        ensure!(
            self.refresh_threshold < self.refresh_interval.as_secs(),
            "refresh-threshold must be less than refresh-interval"
        );
        ensure!(self.max_retry >= 1, "max-retry must be at least 1");
        ensure!(self.max_object_id >= 1, "max-object-id must be at least 1");
        ensure!(!self.api_base_url.is_empty(), "api-base-url must not be empty");
        Ok(self)
    }

    /// Countdown start value, in whole seconds.
    pub fn refresh_secs(&self) -> u64 {
        self.refresh_interval.as_secs()
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(20),
            refresh_threshold: 4,
            primary_image_preferred: false,
            api_base_url: MET_OBJECTS_URL.to_string(),
            max_object_id: MET_CATALOG_SIZE,
            max_retry: 100,
            request_timeout: None,
        }
    }
}
