use crate::sink::error::SinkError;
use crate::types::air_quality::AirQualityReading;
use log::debug;
use polars::prelude::*;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::Receiver;
use tokio::task;

/// Blocking, append-only CSV writer owned by the sink's writer task.
pub(crate) struct RowWriter {
    file: File,
    path: PathBuf,
    header_pending: bool,
}

impl RowWriter {
    pub(crate) fn open(path: &Path) -> Result<Self, SinkError> {
        let path = path.to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SinkError::Open(path.clone(), e))?;
        let header_pending = file
            .metadata()
            .map_err(|e| SinkError::Metadata(path.clone(), e))?
            .len()
            == 0;
        Ok(Self {
            file,
            path,
            header_pending,
        })
    }

    /// Appends one row and flushes it before returning.
    pub(crate) fn write(&mut self, reading: &AirQualityReading) -> Result<(), SinkError> {
        let mut row = reading_frame(reading)?;
        CsvWriter::new(&mut self.file)
            .include_header(self.header_pending)
            .finish(&mut row)
            .map_err(|e| SinkError::Write(self.path.clone(), e))?;
        self.file
            .flush()
            .map_err(|e| SinkError::Flush(self.path.clone(), e))?;
        self.header_pending = false;
        Ok(())
    }

    /// Writes every reading received until all senders are dropped. Returns the
    /// number of rows written.
    ///
    /// Waiting for the next reading happens on the async side; only the polars
    /// write and flush of a single row run on the blocking pool.
    pub(crate) async fn drain(self, mut receiver: Receiver<AirQualityReading>) -> Result<usize, SinkError> {
        let mut writer = self;
        let mut rows = 0;
        while let Some(reading) = receiver.recv().await {
            let point = reading.point;
            writer = task::spawn_blocking(move || {
                let mut writer = writer;
                writer.write(&reading)?;
                Ok::<_, SinkError>(writer)
            })
            .await??;
            rows += 1;
            debug!("Wrote row {} for {}", rows, point);
        }
        Ok(rows)
    }
}

fn reading_frame(reading: &AirQualityReading) -> Result<DataFrame, SinkError> {
    let c = &reading.components;
    df!(
        "latitude" => [reading.point.latitude],
        "longitude" => [reading.point.longitude],
        "index" => [i32::from(reading.index)],
        "co" => [c.co],
        "no" => [c.no],
        "no2" => [c.no2],
        "o3" => [c.o3],
        "so2" => [c.so2],
        "pm2.5" => [c.pm2_5],
        "pm10" => [c.pm10],
        "nh3" => [c.nh3],
        "timestamp" => [reading.timestamp_string()],
        "is_land" => [true],
    )
    .map_err(|e| SinkError::RowBuild(reading.point.to_string(), e))
}
