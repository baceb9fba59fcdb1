use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LandMaskError {
    #[error("Failed to read land mask file '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Land mask file '{path}' has {found} columns, expected at least 3 (latitude, longitude, is_land)")]
    ColumnCount { path: PathBuf, found: usize },

    #[error("Invalid coordinate '{value}' in row {row} of land mask file '{path}'")]
    InvalidCoordinate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("Missing value in row {row} of land mask file '{path}'")]
    MissingValue { path: PathBuf, row: usize },

    #[error("Failed Polars column operation on land mask file '{0}'")]
    ColumnOperation(PathBuf, #[source] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
