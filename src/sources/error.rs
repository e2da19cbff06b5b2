// src/sources/error.rs
use std::time::Duration;

/// Closed set of ways a retrieval (or an aggregation over retrievals) can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("upstream responded with status {0}")]
    UpstreamStatus(u16),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("no items found in scraped page")]
    EmptyScrapeResult,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("source '{source_name}' did not answer within {timeout:?}")]
    DeadlineExceeded {
        source_name: String,
        timeout: Duration,
    },

    #[error("retrieval task failed: {0}")]
    TaskFailed(String),
}

impl FetchError {
    /// Stable snake_case label, used for headers and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NetworkFailure(_) => "network_failure",
            FetchError::UpstreamStatus(_) => "upstream_status",
            FetchError::MalformedPayload(_) => "malformed_payload",
            FetchError::EmptyScrapeResult => "empty_scrape_result",
            FetchError::InvalidConfiguration(_) => "invalid_configuration",
            FetchError::DeadlineExceeded { .. } => "deadline_exceeded",
            FetchError::TaskFailed(_) => "task_failed",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return FetchError::MalformedPayload(e.to_string());
        }
        match e.status() {
            Some(status) => FetchError::UpstreamStatus(status.as_u16()),
            None => FetchError::NetworkFailure(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::MalformedPayload(e.to_string())
    }
}
