//! Air-quality observations returned by a provider for one grid point.

use crate::types::grid_point::GridPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pollutant concentrations in μg/m³ as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Carbon monoxide.
    pub co: f64,
    /// Nitrogen monoxide.
    pub no: f64,
    /// Nitrogen dioxide.
    pub no2: f64,
    /// Ozone.
    pub o3: f64,
    /// Sulphur dioxide.
    pub so2: f64,
    /// Fine particulate matter.
    pub pm2_5: f64,
    /// Coarse particulate matter.
    pub pm10: f64,
    /// Ammonia.
    pub nh3: f64,
}

/// A successful fetch: the air-quality index, the individual concentrations and
/// the time the provider observed them.
#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityReading {
    pub point: GridPoint,
    /// Provider's air-quality index (1 = good … 5 = very poor for OpenWeather).
    pub index: u8,
    pub components: Components,
    pub observed_at: DateTime<Utc>,
}

impl AirQualityReading {
    /// The observation time as written to the output table.
    pub fn timestamp_string(&self) -> String {
        self.observed_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
