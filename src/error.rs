use crate::fetch::error::FetchError;
use crate::land_mask::error::LandMaskError;
use crate::sink::error::SinkError;
use thiserror::Error;

/// Errors that abort a run. Per-point fetch failures never surface here; they
/// are handled by the worker and reported in [`crate::RunSummary`].
#[derive(Debug, Error)]
pub enum AqGridError {
    #[error("No credentials configured; set a non-empty, comma-delimited list")]
    NoCredentials,

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    LandMask(#[from] LandMaskError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Failed to build the provider client")]
    Provider(#[source] FetchError),
}
