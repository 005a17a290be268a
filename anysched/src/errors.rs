//! Error types for anysched

use std::time::Duration;

use thiserror::Error;

/// Main error type for anysched
#[derive(Error, Debug)]
pub enum SchedError {
    #[error("unknown backend type {kind:?}; valid options are: {known:?}")]
    UnknownBackend { kind: String, known: Vec<String> },

    #[error("invalid backend address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("{call} failed: {source}")]
    Backend {
        call: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("{backend}.{call}: not implemented for this backend")]
    NotImplemented {
        backend: &'static str,
        call: &'static str,
    },

    #[error("deployment {name:?} exceeded its progress deadline")]
    ProgressDeadlineExceeded { name: String },

    #[error("timed out after {timeout:?}")]
    TimedOut {
        timeout: Duration,
        #[source]
        source: tokio::time::error::Elapsed,
    },

    #[error("wait cancelled after {elapsed:?}")]
    Cancelled { elapsed: Duration },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SchedError {
    /// Wrap a REST client error with the name of the failing call
    pub fn backend(call: &'static str) -> impl FnOnce(ApiError) -> SchedError {
        move |source| SchedError::Backend { call, source }
    }

    /// Whether the backend reported a definitive failure of the operation
    pub fn is_terminal(&self) -> bool {
        matches!(self, SchedError::ProgressDeadlineExceeded { .. })
    }

    /// Whether the backend cannot perform the requested call at all
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, SchedError::NotImplemented { .. })
    }
}

/// Error returned by the backend REST client
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl ApiError {
    /// Whether the backend answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::Status { status, .. } if *status == reqwest::StatusCode::NOT_FOUND
        )
    }
}
