//! In-memory provider used by scheduler and worker tests.

use crate::fetch::error::FetchError;
use crate::fetch::provider::AirQualityProvider;
use crate::types::air_quality::{AirQualityReading, Components};
use crate::types::credential::Credential;
use crate::types::grid_point::{GridPoint, PointKey};
use chrono::DateTime;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// One scripted answer. Points without a script always succeed.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Success,
    RateLimited(Option<Duration>),
    Transient,
    Rejected(StatusCode),
    /// Never answers; relies on the worker's timeout.
    Hang,
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub point: GridPoint,
    pub credential: Credential,
    pub at: Instant,
}

#[derive(Default)]
pub(crate) struct ScriptedProvider {
    scripts: Mutex<HashMap<PointKey, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues replies for `point`; once exhausted the point succeeds.
    pub fn script(self, point: GridPoint, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(point.key(), replies.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, point: GridPoint) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.point.key() == point.key())
            .collect()
    }

    pub fn reading_for(point: GridPoint) -> AirQualityReading {
        // Deterministic values so repeated runs produce identical rows.
        let seed = (point.latitude * 10.0).abs() + (point.longitude * 10.0).abs();
        AirQualityReading {
            point,
            index: (seed as u64 % 5 + 1) as u8,
            components: Components {
                co: seed,
                no: 0.1,
                no2: 0.2,
                o3: 0.3,
                so2: 0.4,
                pm2_5: 0.5,
                pm10: 0.6,
                nh3: 0.7,
            },
            observed_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }
}

impl AirQualityProvider for ScriptedProvider {
    async fn fetch(
        &self,
        point: GridPoint,
        credential: &Credential,
    ) -> Result<AirQualityReading, FetchError> {
        self.calls.lock().unwrap().push(Call {
            point,
            credential: credential.clone(),
            at: Instant::now(),
        });
        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&point.key())
            .and_then(VecDeque::pop_front)
            .unwrap_or(Reply::Success);

        match reply {
            Reply::Success => Ok(Self::reading_for(point)),
            Reply::RateLimited(retry_after) => Err(FetchError::RateLimited { retry_after }),
            Reply::Transient => Err(FetchError::IncompletePayload("empty reading list".into())),
            Reply::Rejected(status) => Err(FetchError::http_status(status, "rejected")),
            Reply::Hang => std::future::pending().await,
        }
    }
}
