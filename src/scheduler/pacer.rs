use log::info;
use std::time::Duration;
use tokio::time::sleep;

/// Fixed-size batching with a full-window pause between batches.
///
/// A batch holds `credentials × quota` requests, so even if every first
/// attempt of a batch lands inside one window, no credential exceeds its quota.
/// Waiting a whole window after each drained batch keeps the next batch out of
/// it. Retries are held back by the [`QuotaLedger`](super::quota::QuotaLedger).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPacer {
    batch_size: usize,
    window: Duration,
}

impl BatchPacer {
    pub fn new(credential_count: usize, quota_per_credential: usize, window: Duration) -> Self {
        Self {
            batch_size: (credential_count * quota_per_credential).max(1),
            window,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn batch_count(&self, requests: usize) -> usize {
        requests.div_ceil(self.batch_size)
    }

    pub fn batches<'a, T>(&self, requests: &'a [T]) -> std::slice::Chunks<'a, T> {
        requests.chunks(self.batch_size)
    }

    /// Blocks for one full window. Call only after the previous batch is drained.
    pub async fn cooldown(&self) {
        info!(
            "Sleeping {:?} before the next batch to respect rate limits",
            self.window
        );
        sleep(self.window).await;
    }
}

/// Worker slots for a run: `per_credential` slots per credential, capped at `cap`.
pub fn max_workers(credential_count: usize, per_credential: usize, cap: usize) -> usize {
    (credential_count * per_credential).min(cap).max(1)
}
