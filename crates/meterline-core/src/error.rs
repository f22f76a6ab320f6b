//! Shared error type across meterline crates.

use thiserror::Error;

/// Stable error codes (logged and returned by the agent's HTTP surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed observation from outside the process.
    BadRequest,
    /// Label-value list with an odd number of entries.
    BadLabels,
    /// Sink write failed mid-flush.
    WriteFailed,
    /// Remote batch send failed.
    DispatchFailed,
    /// Malformed configuration.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::BadLabels => "BAD_LABELS",
            ErrorCode::WriteFailed => "WRITE_FAILED",
            ErrorCode::DispatchFailed => "DISPATCH_FAILED",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MeterlineError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum MeterlineError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("odd number of label values: {0}")]
    OddLabelValues(usize),
    /// `written` is the byte count that reached the sink before the failure.
    #[error("write failed after {written} bytes: {source}")]
    Write {
        written: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("dispatch failed: {0}")]
    Dispatch(String),
    #[error("bad config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl MeterlineError {
    /// Map the error to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MeterlineError::BadRequest(_) => ErrorCode::BadRequest,
            MeterlineError::OddLabelValues(_) => ErrorCode::BadLabels,
            MeterlineError::Write { .. } => ErrorCode::WriteFailed,
            MeterlineError::Dispatch(_) => ErrorCode::DispatchFailed,
            MeterlineError::Config(_) => ErrorCode::BadConfig,
            MeterlineError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MeterlineError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Bytes written before a flush failed; zero for non-write errors.
    pub fn written(&self) -> u64 {
        match self {
            MeterlineError::Write { written, .. } => *written,
            _ => 0,
        }
    }
}
