use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to open output file '{0}'")]
    Open(PathBuf, #[source] std::io::Error),

    #[error("Failed to read metadata for output file '{0}'")]
    Metadata(PathBuf, #[source] std::io::Error),

    #[error("Failed to build output row for {0}")]
    RowBuild(String, #[source] PolarsError),

    #[error("Failed to write row to output file '{0}'")]
    Write(PathBuf, #[source] PolarsError),

    #[error("Failed to flush output file '{0}'")]
    Flush(PathBuf, #[source] std::io::Error),

    #[error("Failed to read results from '{0}'")]
    Read(PathBuf, #[source] PolarsError),

    #[error("Result writer stopped before the run finished")]
    Closed,

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
