mod config;
mod credentials;
mod error;
mod fetch;
mod grid;
mod land_mask;
mod run;
mod scheduler;
mod sink;
mod types;

pub use config::{FetchConfig, DEFAULT_BASE_URL};
pub use credentials::{CredentialPool, DEFAULT_CREDENTIALS_VAR};
pub use error::AqGridError;
pub use grid::GridSpec;
pub use run::fetch_grid;

pub use fetch::error::{Disposition, FetchError};
pub use fetch::provider::{AirQualityProvider, OpenWeatherProvider};
pub use fetch::worker::{FetchOutcome, FetchRequest, FetchWorker, RetryPolicy};

pub use land_mask::error::LandMaskError;
pub use land_mask::LandMask;

pub use scheduler::pacer::{max_workers, BatchPacer};
pub use scheduler::quota::QuotaLedger;
pub use scheduler::{FailedPoint, RunSummary, Scheduler};

pub use sink::error::SinkError;
pub use sink::{read_results, ResultSink, RESULT_COLUMNS};

pub use types::air_quality::{AirQualityReading, Components};
pub use types::credential::Credential;
pub use types::grid_point::GridPoint;
