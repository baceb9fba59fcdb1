//! Tunables for pacing, concurrency and retries.

use crate::error::AqGridError;
use bon::Builder;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";

/// Run configuration. Every field has a default matching the provider's free
/// tier (60 calls per key per minute).
///
/// # Examples
///
/// ```
/// use aqgrid::FetchConfig;
/// use std::time::Duration;
///
/// let config = FetchConfig::builder()
///     .quota_per_credential(30)
///     .max_attempts(5)
///     .build();
/// assert_eq!(config.window, Duration::from_secs(60));
/// assert_eq!(config.quota_per_credential, 30);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct FetchConfig {
    /// Requests each credential may issue per `window`.
    #[builder(default = 60)]
    pub quota_per_credential: usize,
    #[builder(default = Duration::from_secs(60))]
    pub window: Duration,
    /// Worker slots granted per credential, before applying `max_workers_cap`.
    #[builder(default = 5)]
    pub workers_per_credential: usize,
    #[builder(default = 20)]
    pub max_workers_cap: usize,
    #[builder(default = Duration::from_secs(10))]
    pub request_timeout: Duration,
    /// Total attempts per point, including the first.
    #[builder(default = 3)]
    pub max_attempts: u32,
    #[builder(default = Duration::from_secs(2))]
    pub retry_delay: Duration,
    /// Fixed pause before every network call.
    #[builder(default = Duration::from_secs(1))]
    pub pre_call_delay: Duration,
    #[builder(default = DEFAULT_BASE_URL.to_string(), into)]
    pub base_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FetchConfig {
    pub(crate) fn validate(&self) -> Result<(), AqGridError> {
        if self.quota_per_credential == 0 {
            return Err(AqGridError::InvalidConfig(
                "quota_per_credential must be at least 1".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(AqGridError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.workers_per_credential == 0 || self.max_workers_cap == 0 {
            return Err(AqGridError::InvalidConfig(
                "worker limits must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
