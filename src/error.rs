//! Error types for the unsubscribe client.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for all unsubscribe client operations.
pub enum Error {
    /// Underlying HTTP client error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Target could not be parsed or has no host.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Request exceeded its time budget.
    #[error("timed out after {}", describe_duration(.0))]
    Timeout(Duration),
    /// Local I/O failure, e.g. reading a message body from disk.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// HTTP response returned a non-success status with body.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// An injected collaborator (fetcher, classifier, store) failed.
    #[error("collaborator error: {0}")]
    Collaborator(String),
}

impl Error {
    /// Maps the error onto the failure taxonomy reported in outcomes.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Http(e) if e.is_timeout() => FailureKind::Timeout,
            Error::Http(e) if e.is_builder() => FailureKind::InvalidUrl,
            Error::Http(_) | Error::Io(_) | Error::Collaborator(_) => FailureKind::NetworkFailure,
            Error::InvalidUrl(_) => FailureKind::InvalidUrl,
            Error::Timeout(_) => FailureKind::Timeout,
            Error::Status { .. } => FailureKind::HttpStatus,
        }
    }
}

/// Why an unsubscribe attempt did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NetworkFailure,
    Timeout,
    InvalidUrl,
    HttpStatus,
    NoFormFound,
    /// The request went through but nothing on the page confirmed removal.
    AmbiguousResult,
}

/// Renders "10 seconds" for whole seconds and "250 milliseconds" otherwise.
pub(crate) fn describe_duration(d: &Duration) -> String {
    if d.subsec_millis() == 0 {
        let secs = d.as_secs();
        format!("{secs} second{}", if secs == 1 { "" } else { "s" })
    } else {
        format!("{} milliseconds", d.as_millis())
    }
}

/// Result type for unsubscribe client operations.
pub type Result<T> = std::result::Result<T, Error>;
