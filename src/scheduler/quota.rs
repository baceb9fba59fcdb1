use crate::types::credential::Credential;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Per-credential log of recent calls.
///
/// Batch sizing keeps first attempts inside the quota; retries reuse the same
/// credential, so every attempt takes a slot here first. When a credential
/// already made `quota` calls in the trailing window, the caller sleeps until
/// the oldest of them leaves it.
#[derive(Debug)]
pub struct QuotaLedger {
    quota: usize,
    window: Duration,
    calls: Mutex<HashMap<Credential, VecDeque<Instant>>>,
}

impl QuotaLedger {
    pub fn new(quota: usize, window: Duration) -> Self {
        Self {
            quota: quota.max(1),
            window,
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for a free slot for `credential` and records a call at the
    /// moment it is granted.
    pub async fn acquire(&self, credential: &Credential) {
        loop {
            let free_at = {
                let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
                let now = Instant::now();
                let log = calls.entry(credential.clone()).or_default();
                while log
                    .front()
                    .is_some_and(|&at| now.duration_since(at) >= self.window)
                {
                    log.pop_front();
                }
                match log.front() {
                    Some(&oldest) if log.len() >= self.quota => oldest + self.window,
                    _ => {
                        log.push_back(now);
                        return;
                    }
                }
            };
            debug!(
                "Credential {} used its quota of {}; waiting {:?}",
                credential,
                self.quota,
                free_at.saturating_duration_since(Instant::now())
            );
            sleep_until(free_at).await;
        }
    }
}
