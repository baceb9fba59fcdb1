//! Batched, bounded-concurrency dispatch of fetch requests.

pub mod pacer;
pub mod quota;

use crate::config::FetchConfig;
use crate::credentials::CredentialPool;
use crate::error::AqGridError;
use crate::fetch::error::FetchError;
use crate::fetch::provider::AirQualityProvider;
use crate::fetch::worker::{FetchOutcome, FetchRequest, FetchWorker, RetryPolicy};
use crate::land_mask::LandMask;
use crate::sink::error::SinkError;
use crate::sink::ResultSink;
use crate::types::grid_point::GridPoint;
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};
use pacer::{max_workers, BatchPacer};
use quota::QuotaLedger;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// A land point that reached a terminal failure. It has no row in the output.
#[derive(Debug)]
pub struct FailedPoint {
    pub point: GridPoint,
    pub attempts: u32,
    pub error: FetchError,
}

/// What happened during one [`Scheduler::run`].
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Points read from the input sequence, duplicates included.
    pub grid_points: usize,
    pub duplicates: usize,
    pub water_skipped: usize,
    /// One per land point.
    pub requests: usize,
    /// Network attempts across all requests.
    pub attempts: u64,
    pub rows_written: usize,
    pub batches: usize,
    pub failed: Vec<FailedPoint>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.requests - self.failed.len()
    }

    /// Elapsed time as `1h 2m 3.45s`.
    pub fn elapsed_hms(&self) -> String {
        let total = self.elapsed.as_secs_f64();
        let hours = (total / 3600.0).floor();
        let minutes = ((total - hours * 3600.0) / 60.0).floor();
        let seconds = total - hours * 3600.0 - minutes * 60.0;
        format!("{}h {}m {:.2}s", hours as u64, minutes as u64, seconds)
    }
}

/// Visits every land point of a grid once, in sequential batches of
/// concurrent requests, and funnels successful readings into a [`ResultSink`].
pub struct Scheduler<P> {
    worker: FetchWorker<P>,
    credentials: CredentialPool,
    land_mask: LandMask,
    pacer: BatchPacer,
    max_workers: usize,
}

impl<P: AirQualityProvider> Scheduler<P> {
    /// # Errors
    ///
    /// Returns [`AqGridError::InvalidConfig`] if `config` has zero quota,
    /// attempts or worker limits.
    pub fn new(
        provider: P,
        credentials: CredentialPool,
        land_mask: LandMask,
        config: &FetchConfig,
    ) -> Result<Self, AqGridError> {
        config.validate()?;
        let pacer = BatchPacer::new(credentials.len(), config.quota_per_credential, config.window);
        let max_workers = max_workers(
            credentials.len(),
            config.workers_per_credential,
            config.max_workers_cap,
        );
        Ok(Self {
            worker: FetchWorker::new(provider, RetryPolicy::from(config))
                .with_quota(QuotaLedger::new(config.quota_per_credential, config.window)),
            credentials,
            land_mask,
            pacer,
            max_workers,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.pacer.batch_size()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn provider(&self) -> &P {
        self.worker.provider()
    }

    /// Turns the input points into requests: one per distinct land point,
    /// each bound to its round-robin credential.
    fn plan(
        &self,
        points: impl IntoIterator<Item = GridPoint>,
        summary: &mut RunSummary,
    ) -> Vec<FetchRequest> {
        let mut seen = HashSet::new();
        let mut requests = Vec::new();
        for point in points {
            summary.grid_points += 1;
            if !seen.insert(point.key()) {
                summary.duplicates += 1;
                continue;
            }
            if !self.land_mask.is_land(&point) {
                debug!("Skipping {} - over water", point);
                summary.water_skipped += 1;
                continue;
            }
            let index = requests.len();
            requests.push(FetchRequest {
                index,
                point,
                credential: self.credentials.assign(index).clone(),
            });
        }
        summary.requests = requests.len();
        requests
    }

    /// Fetches every land point in `points` and writes the successes to `sink`.
    ///
    /// Batches run strictly one after another with a full window of cooldown in
    /// between; inside a batch up to [`Scheduler::max_workers`] requests are in
    /// flight and results are handled in completion order. Per-point failures
    /// are recorded in the returned summary, never returned as errors.
    ///
    /// # Errors
    ///
    /// Returns [`AqGridError::Sink`] if the output can't be written. Rows
    /// already written stay in place.
    pub async fn run(
        &self,
        points: impl IntoIterator<Item = GridPoint>,
        sink: ResultSink,
    ) -> Result<RunSummary, AqGridError> {
        let started = Instant::now();
        let mut summary = RunSummary::default();
        let requests = self.plan(points, &mut summary);
        let batch_count = self.pacer.batch_count(requests.len());
        info!(
            "{} of {} grid points are on land; fetching in {} batches of up to {} with {} workers",
            requests.len(),
            summary.grid_points,
            batch_count,
            self.pacer.batch_size(),
            self.max_workers
        );

        for (i, batch) in self.pacer.batches(&requests).enumerate() {
            if i > 0 {
                self.pacer.cooldown().await;
            }
            if let Err(error) = self.process_batch(batch, &sink, &mut summary).await {
                warn!("Stopping run: {}", error);
                // The writer's own error explains why the channel closed.
                sink.finish().await?;
                return Err(error.into());
            }
            summary.batches += 1;
            info!(
                "Batch {}/{} drained: {} of {} requests done, {} failed",
                i + 1,
                batch_count,
                (i * self.pacer.batch_size() + batch.len()),
                requests.len(),
                summary.failed.len()
            );
        }

        summary.rows_written = sink.finish().await?;
        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    async fn process_batch(
        &self,
        batch: &[FetchRequest],
        sink: &ResultSink,
        summary: &mut RunSummary,
    ) -> Result<(), SinkError> {
        let mut outcomes = stream::iter(batch)
            .map(|request| self.worker.run(request))
            .buffer_unordered(self.max_workers);

        while let Some(outcome) = outcomes.next().await {
            summary.attempts += u64::from(outcome.attempts());
            match outcome {
                FetchOutcome::Success { reading, .. } => sink.submit(reading).await?,
                FetchOutcome::Failed {
                    point,
                    attempts,
                    error,
                } => summary.failed.push(FailedPoint {
                    point,
                    attempts,
                    error,
                }),
            }
        }
        Ok(())
    }
}
