//! The outbound air-quality call.

use crate::fetch::error::FetchError;
use crate::types::air_quality::{AirQualityReading, Components};
use crate::types::credential::Credential;
use crate::types::grid_point::GridPoint;
use chrono::DateTime;
use log::debug;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

const AIR_POLLUTION_PATH: &str = "/data/2.5/air_pollution";

/// A source of air-quality readings. One call is one network attempt; retries
/// are the caller's business.
pub trait AirQualityProvider: Send + Sync {
    fn fetch(
        &self,
        point: GridPoint,
        credential: &Credential,
    ) -> impl Future<Output = Result<AirQualityReading, FetchError>> + Send;
}

/// OpenWeather "Air Pollution" API client.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct AirPollutionResponse {
    list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct AirPollutionEntry {
    main: AirQualityIndex,
    components: Components,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct AirQualityIndex {
    aqi: u8,
}

impl OpenWeatherProvider {
    /// Creates a provider talking to `base_url` (e.g. `http://api.openweathermap.org`)
    /// with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), AIR_POLLUTION_PATH),
            timeout,
        })
    }

    fn parse_reading(point: GridPoint, bytes: &[u8]) -> Result<AirQualityReading, FetchError> {
        let payload: AirPollutionResponse =
            serde_json::from_slice(bytes).map_err(FetchError::MalformedPayload)?;
        let entry = payload
            .list
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::IncompletePayload("empty reading list".into()))?;
        let observed_at = DateTime::from_timestamp(entry.dt, 0).ok_or_else(|| {
            FetchError::IncompletePayload(format!("timestamp {} out of range", entry.dt))
        })?;
        Ok(AirQualityReading {
            point,
            index: entry.main.aqi,
            components: entry.components,
            observed_at,
        })
    }
}

/// Reads a `Retry-After` header given in whole seconds. HTTP-date values are
/// ignored and fall back to the configured delay.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

impl AirQualityProvider for OpenWeatherProvider {
    async fn fetch(
        &self,
        point: GridPoint,
        credential: &Credential,
    ) -> Result<AirQualityReading, FetchError> {
        debug!("GET {} for {} with key {}", self.endpoint, point, credential);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
                ("appid", credential.expose().to_string()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::http_status(status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;
        Self::parse_reading(point, &bytes)
    }
}
