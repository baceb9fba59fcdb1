use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

// Longest response body kept in an error message.
const MAX_BODY_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Rate limited by provider (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    // reqwest errors are stored without their URL, which carries the credential.
    #[error("Network request failed")]
    Network(#[source] reqwest::Error),

    #[error("Provider returned HTTP {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    #[error("Malformed payload")]
    MalformedPayload(#[source] serde_json::Error),

    #[error("Incomplete payload: {0}")]
    IncompletePayload(String),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Gave up after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

/// What the worker should do after an attempt failed with a given error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Try again, after `wait` if the provider suggested one, else after the
    /// configured retry delay.
    Retry { wait: Option<Duration> },
    /// Terminal failure for this point.
    Stop,
}

impl FetchError {
    pub(crate) fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Network(error.without_url())
        }
    }

    pub(crate) fn http_status(status: StatusCode, body: &str) -> Self {
        FetchError::HttpStatus {
            status,
            body: body.chars().take(MAX_BODY_CHARS).collect(),
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            FetchError::RateLimited { retry_after } => Disposition::Retry {
                wait: *retry_after,
            },
            FetchError::Timeout(_)
            | FetchError::Network(_)
            | FetchError::MalformedPayload(_)
            | FetchError::IncompletePayload(_) => Disposition::Retry { wait: None },
            FetchError::HttpStatus { status, .. } => {
                if *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || status.is_server_error()
                {
                    Disposition::Retry { wait: None }
                } else {
                    Disposition::Stop
                }
            }
            FetchError::ClientBuild(_) | FetchError::RetriesExhausted { .. } => Disposition::Stop,
        }
    }
}
