use aqgrid::{fetch_grid, AqGridError, CredentialPool, FetchConfig, GridSpec, DEFAULT_BASE_URL};
use clap::Parser;
use log::{error, info, warn};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Fetch air-quality readings for every land point of the continental US grid.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Land/water mask CSV (latitude, longitude, is_land).
    #[arg(long, default_value = "land_water_map.csv")]
    land_mask: PathBuf,

    /// Result CSV; rows are appended if the file exists.
    #[arg(long, default_value = "aqi_data.csv")]
    output: PathBuf,

    /// Comma-delimited provider API keys.
    #[arg(long, env = "API_KEYS", hide_env_values = true, default_value = "")]
    api_keys: String,

    /// Requests per key per minute.
    #[arg(long, default_value_t = 60)]
    quota: usize,

    /// Attempts per grid point, including the first.
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Seconds to wait before retrying when the provider gives no hint.
    #[arg(long, default_value_t = 2)]
    retry_delay_secs: u64,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

async fn run(args: Args) -> Result<(), AqGridError> {
    let credentials = CredentialPool::from_delimited(&args.api_keys)?;
    let config = FetchConfig::builder()
        .quota_per_credential(args.quota)
        .max_attempts(args.max_attempts)
        .retry_delay(Duration::from_secs(args.retry_delay_secs))
        .request_timeout(Duration::from_secs(args.timeout_secs))
        .base_url(args.base_url)
        .build();
    info!(
        "Fetching {} grid points with {} keys",
        GridSpec::CONTINENTAL_US.len(),
        credentials.len()
    );

    let summary = fetch_grid()
        .credentials(credentials)
        .land_mask_path(&args.land_mask)
        .output_path(&args.output)
        .config(config)
        .call()
        .await?;

    for failed in &summary.failed {
        warn!(
            "No data for {} after {} attempts: {}",
            failed.point, failed.attempts, failed.error
        );
    }
    info!(
        "AQI data saved to {}: {} rows, {} failed, {} water points skipped",
        args.output.display(),
        summary.rows_written,
        summary.failed.len(),
        summary.water_skipped
    );
    info!("Total execution time: {}", summary.elapsed_hms());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
