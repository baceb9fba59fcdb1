use aqgrid::{fetch_grid, read_results, CredentialPool, FetchConfig, GridSpec};
use std::env;
use std::path::Path;

// Run with `API_KEYS=key1,key2 cargo run --example fetch_grid -- land_water_map.csv`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    configure_polars_display();

    let land_mask = env::args()
        .nth(1)
        .unwrap_or_else(|| "land_water_map.csv".to_string());
    let output = Path::new("aqi_colorado.csv");

    // Colorado only, so the demo finishes in a single batch.
    let grid = GridSpec::new(37.0, 41.0, -109.0, -102.0, 0.5)?;
    let summary = fetch_grid()
        .credentials(CredentialPool::from_env("API_KEYS")?)
        .land_mask_path(Path::new(&land_mask))
        .output_path(output)
        .grid(grid)
        .config(FetchConfig::builder().max_attempts(2).build())
        .call()
        .await?;

    println!(
        "{} of {} land points fetched in {}",
        summary.succeeded(),
        summary.requests,
        summary.elapsed_hms()
    );
    for failed in &summary.failed {
        println!("failed: {} after {} attempts", failed.point, failed.attempts);
    }

    let frame = read_results(output).await?;
    println!("{:#?}", frame);

    Ok(())
}

fn configure_polars_display() {
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
