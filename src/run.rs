//! One-call entry point wiring the land mask, provider, scheduler and sink.

use crate::config::FetchConfig;
use crate::credentials::CredentialPool;
use crate::error::AqGridError;
use crate::fetch::provider::OpenWeatherProvider;
use crate::grid::GridSpec;
use crate::land_mask::LandMask;
use crate::scheduler::{RunSummary, Scheduler};
use crate::sink::ResultSink;
use bon::builder;
use std::path::Path;

/// Fetches air-quality readings for every land point of `grid` from the
/// OpenWeather API and appends them to `output_path`.
///
/// This function uses a builder pattern.
///
/// # Arguments
///
/// * `.credentials(CredentialPool)`: **Required.** Keys to rotate through.
/// * `.land_mask_path(&Path)`: **Required.** CSV with `latitude, longitude, is_land`.
/// * `.output_path(&Path)`: **Required.** Result CSV, appended to if it exists.
/// * `.grid(GridSpec)`: Optional. Defaults to [`GridSpec::CONTINENTAL_US`].
/// * `.config(FetchConfig)`: Optional. Defaults to [`FetchConfig::default`].
///
/// # Errors
///
/// Only startup and output failures are errors: an unreadable land mask, an
/// invalid configuration, or an output file that can't be written. Points that
/// fail to fetch are listed in [`RunSummary::failed`].
///
/// # Examples
///
/// ```no_run
/// # use aqgrid::{fetch_grid, AqGridError, CredentialPool};
/// # use std::path::Path;
/// # #[tokio::main]
/// # async fn main() -> Result<(), AqGridError> {
/// let summary = fetch_grid()
///     .credentials(CredentialPool::from_env("API_KEYS")?)
///     .land_mask_path(Path::new("land_water_map.csv"))
///     .output_path(Path::new("aqi.csv"))
///     .call()
///     .await?;
/// println!("{} rows in {}", summary.rows_written, summary.elapsed_hms());
/// # Ok(())
/// # }
/// ```
#[builder]
pub async fn fetch_grid(
    credentials: CredentialPool,
    land_mask_path: &Path,
    output_path: &Path,
    #[builder(default = GridSpec::CONTINENTAL_US)] grid: GridSpec,
    #[builder(default)] config: FetchConfig,
) -> Result<RunSummary, AqGridError> {
    let land_mask = LandMask::from_csv(land_mask_path).await?;
    let provider = OpenWeatherProvider::new(&config.base_url, config.request_timeout)
        .map_err(AqGridError::Provider)?;
    let scheduler = Scheduler::new(provider, credentials, land_mask, &config)?;
    let sink = ResultSink::create(output_path).await?;
    scheduler.run(grid.points(), sink).await
}
