//! Single-request fetch with timeout, classification and bounded retries.

use crate::config::FetchConfig;
use crate::fetch::error::{Disposition, FetchError};
use crate::fetch::provider::AirQualityProvider;
use crate::scheduler::quota::QuotaLedger;
use crate::types::air_quality::AirQualityReading;
use crate::types::credential::Credential;
use crate::types::grid_point::GridPoint;
use log::{info, warn};
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Retry behaviour applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before a retry when the provider gives no hint.
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub pre_call_delay: Duration,
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            retry_delay: config.retry_delay,
            request_timeout: config.request_timeout,
            pre_call_delay: config.pre_call_delay,
        }
    }
}

/// One land point bound to the credential that will serve it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Position among the run's requests; determines the credential.
    pub index: usize,
    pub point: GridPoint,
    pub credential: Credential,
}

/// Terminal outcome of a request.
#[derive(Debug)]
pub enum FetchOutcome {
    Success {
        reading: AirQualityReading,
        attempts: u32,
    },
    Failed {
        point: GridPoint,
        attempts: u32,
        error: FetchError,
    },
}

impl FetchOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            FetchOutcome::Success { attempts, .. } | FetchOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Non-terminal request states. Terminal states are the [`FetchOutcome`]
/// variants returned from [`FetchWorker::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestState {
    Pending,
    Fetching { attempt: u32 },
    Backoff { attempt: u32, delay: Duration },
}

pub struct FetchWorker<P> {
    provider: P,
    policy: RetryPolicy,
    quota: Option<QuotaLedger>,
}

impl<P: AirQualityProvider> FetchWorker<P> {
    pub fn new(provider: P, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            quota: None,
        }
    }

    /// Makes every attempt, retries included, wait for a free slot on its
    /// credential before calling the provider.
    pub fn with_quota(mut self, ledger: QuotaLedger) -> Self {
        self.quota = Some(ledger);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Drives `request` to a terminal outcome. Never returns an error: every
    /// failure is folded into [`FetchOutcome::Failed`].
    pub async fn run(&self, request: &FetchRequest) -> FetchOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut state = RequestState::Pending;
        loop {
            state = match state {
                RequestState::Pending => RequestState::Fetching { attempt: 1 },
                RequestState::Fetching { attempt } => {
                    let error = match self.attempt(request).await {
                        Ok(reading) => {
                            info!(
                                "Fetched AQI {} for {} (attempt {}/{})",
                                reading.index, request.point, attempt, max_attempts
                            );
                            return FetchOutcome::Success {
                                reading,
                                attempts: attempt,
                            };
                        }
                        Err(error) => error,
                    };

                    match error.disposition() {
                        Disposition::Stop => {
                            warn!(
                                "Giving up on {} after attempt {}: {}",
                                request.point, attempt, error
                            );
                            return FetchOutcome::Failed {
                                point: request.point,
                                attempts: attempt,
                                error,
                            };
                        }
                        Disposition::Retry { .. } if attempt >= max_attempts => {
                            warn!(
                                "All {} attempts failed for {}: {}",
                                max_attempts, request.point, error
                            );
                            return FetchOutcome::Failed {
                                point: request.point,
                                attempts: attempt,
                                error: FetchError::RetriesExhausted {
                                    attempts: attempt,
                                    last: Box::new(error),
                                },
                            };
                        }
                        Disposition::Retry { wait } => {
                            let delay = wait.unwrap_or(self.policy.retry_delay);
                            warn!(
                                "Attempt {}/{} for {} failed ({}); retrying in {:?}",
                                attempt, max_attempts, request.point, error, delay
                            );
                            RequestState::Backoff { attempt, delay }
                        }
                    }
                }
                RequestState::Backoff { attempt, delay } => {
                    sleep(delay).await;
                    RequestState::Fetching {
                        attempt: attempt + 1,
                    }
                }
            };
        }
    }

    async fn attempt(&self, request: &FetchRequest) -> Result<AirQualityReading, FetchError> {
        if !self.policy.pre_call_delay.is_zero() {
            sleep(self.policy.pre_call_delay).await;
        }
        if let Some(ledger) = &self.quota {
            ledger.acquire(&request.credential).await;
        }
        timeout(
            self.policy.request_timeout,
            self.provider.fetch(request.point, &request.credential),
        )
        .await
        .unwrap_or_else(|_| Err(FetchError::Timeout(self.policy.request_timeout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::scripted::{Reply, ScriptedProvider};
    use reqwest::StatusCode;

    fn policy() -> RetryPolicy {
        RetryPolicy::from(&FetchConfig::default())
    }

    fn request(point: GridPoint) -> FetchRequest {
        FetchRequest {
            index: 0,
            point,
            credential: Credential::new("key-a"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let point = GridPoint::new(40.0, -100.0);
        let worker = FetchWorker::new(ScriptedProvider::new(), policy());

        let outcome = worker.run(&request(point)).await;

        assert!(matches!(outcome, FetchOutcome::Success { attempts: 1, .. }));
        assert_eq!(worker.provider().calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pre_call_delay_precedes_network_call() {
        let point = GridPoint::new(40.0, -100.0);
        let worker = FetchWorker::new(ScriptedProvider::new(), policy());
        let start = tokio::time::Instant::now();

        worker.run(&request(point)).await;

        let call = &worker.provider().calls()[0];
        assert!(call.at - start >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_hint_delays_next_attempt() {
        let point = GridPoint::new(40.0, -100.0);
        let provider = ScriptedProvider::new()
            .script(point, [Reply::RateLimited(Some(Duration::from_secs(5)))]);
        let worker = FetchWorker::new(provider, policy());

        let outcome = worker.run(&request(point)).await;

        assert!(matches!(outcome, FetchOutcome::Success { attempts: 2, .. }));
        let calls = worker.provider().calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].at - calls[0].at >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_without_hint_uses_retry_delay() {
        let point = GridPoint::new(40.0, -100.0);
        let provider = ScriptedProvider::new().script(point, [Reply::RateLimited(None)]);
        let policy = RetryPolicy {
            retry_delay: Duration::from_secs(7),
            pre_call_delay: Duration::ZERO,
            ..policy()
        };
        let worker = FetchWorker::new(provider, policy);

        worker.run(&request(point)).await;

        let calls = worker.provider().calls();
        assert!(calls[1].at - calls[0].at >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried() {
        let point = GridPoint::new(40.0, -100.0);
        let provider = ScriptedProvider::new().script(point, [Reply::Transient, Reply::Transient]);
        let worker = FetchWorker::new(provider, policy());

        let outcome = worker.run(&request(point)).await;

        assert!(matches!(outcome, FetchOutcome::Success { attempts: 3, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_bounded() {
        let point = GridPoint::new(40.0, -100.0);
        let provider = ScriptedProvider::new().script(point, vec![Reply::Transient; 10]);
        let worker = FetchWorker::new(provider, policy());

        let outcome = worker.run(&request(point)).await;

        match outcome {
            FetchOutcome::Failed {
                attempts, error, ..
            } => {
                assert_eq!(attempts, 3);
                assert!(matches!(
                    error,
                    FetchError::RetriesExhausted { attempts: 3, .. }
                ));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(worker.provider().calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_terminal() {
        let point = GridPoint::new(40.0, -100.0);
        let provider =
            ScriptedProvider::new().script(point, [Reply::Rejected(StatusCode::UNAUTHORIZED)]);
        let worker = FetchWorker::new(provider, policy());

        let outcome = worker.run(&request(point)).await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failed {
                attempts: 1,
                error: FetchError::HttpStatus { .. },
                ..
            }
        ));
        assert_eq!(worker.provider().calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_request_times_out_and_retries() {
        let point = GridPoint::new(40.0, -100.0);
        let provider = ScriptedProvider::new().script(point, [Reply::Hang]);
        let worker = FetchWorker::new(provider, policy());
        let start = tokio::time::Instant::now();

        let outcome = worker.run(&request(point)).await;

        assert!(matches!(outcome, FetchOutcome::Success { attempts: 2, .. }));
        // pre-call delay + timeout + retry delay + pre-call delay
        assert!(tokio::time::Instant::now() - start >= Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_for_credential_quota() {
        let point = GridPoint::new(40.0, -100.0);
        let provider = ScriptedProvider::new().script(point, [Reply::Transient]);
        let worker = FetchWorker::new(provider, policy())
            .with_quota(QuotaLedger::new(1, Duration::from_secs(30)));

        let outcome = worker.run(&request(point)).await;

        assert!(matches!(outcome, FetchOutcome::Success { attempts: 2, .. }));
        let calls = worker.provider().calls();
        // Without the ledger the retry would follow after 3 s.
        assert!(calls[1].at - calls[0].at >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy() {
        let point = GridPoint::new(40.0, -100.0);
        let provider = ScriptedProvider::new().script(point, [Reply::Transient]);
        let policy = RetryPolicy {
            max_attempts: 1,
            ..policy()
        };
        let worker = FetchWorker::new(provider, policy);

        let outcome = worker.run(&request(point)).await;

        assert_eq!(outcome.attempts(), 1);
        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
    }
}
