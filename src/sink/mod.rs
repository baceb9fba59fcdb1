//! Single-writer output of fetched readings.
//!
//! Workers never touch the output file. Readings are sent over a channel to
//! one writer task, which appends and flushes each row before it accepts the
//! next, so a crashed run leaves a valid prefix of rows behind.

pub mod error;
mod writer;

use crate::types::air_quality::AirQualityReading;
use error::SinkError;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use writer::RowWriter;

// Readings queued between the scheduler and the writer task.
const ROW_BUFFER: usize = 64;

/// Column names of the output table, in order.
pub const RESULT_COLUMNS: [&str; 13] = [
    "latitude",
    "longitude",
    "index",
    "co",
    "no",
    "no2",
    "o3",
    "so2",
    "pm2.5",
    "pm10",
    "nh3",
    "timestamp",
    "is_land",
];

pub struct ResultSink {
    path: PathBuf,
    sender: mpsc::Sender<AirQualityReading>,
    writer: JoinHandle<Result<usize, SinkError>>,
}

impl ResultSink {
    /// Opens `path` for appending (creating it if needed) and starts the writer
    /// task. The header row is written only if the file is empty.
    pub async fn create(path: &Path) -> Result<Self, SinkError> {
        let path_buf = path.to_path_buf();
        let row_writer = task::spawn_blocking(move || RowWriter::open(&path_buf)).await??;
        let (sender, receiver) = mpsc::channel(ROW_BUFFER);
        let writer = task::spawn(row_writer.drain(receiver));
        info!("Writing results to {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            sender,
            writer,
        })
    }

    /// Hands one reading to the writer task.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] if the writer has stopped; [`ResultSink::finish`]
    /// then reports why.
    pub async fn submit(&self, reading: AirQualityReading) -> Result<(), SinkError> {
        self.sender
            .send(reading)
            .await
            .map_err(|_| SinkError::Closed)
    }

    /// Closes the channel, waits for pending rows to be written and returns the
    /// number of rows this sink wrote.
    pub async fn finish(self) -> Result<usize, SinkError> {
        drop(self.sender);
        let rows = self.writer.await??;
        info!("Wrote {} rows to {}", rows, self.path.display());
        Ok(rows)
    }
}

/// Loads a result table written by [`ResultSink`].
pub async fn read_results(path: &Path) -> Result<DataFrame, SinkError> {
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path_buf.clone()))
            .map_err(|e| SinkError::Read(path_buf.clone(), e))?
            .finish()
            .map_err(|e| SinkError::Read(path_buf, e))
    })
    .await?
}
