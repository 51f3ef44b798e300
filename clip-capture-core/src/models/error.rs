use thiserror::Error;

/// Errors that can occur while capturing, buffering, or persisting clips.
///
/// A failed hardware read inside the capture loop is not surfaced here; it is
/// logged and counted in the diagnostics instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("capacity exceeded: requested {requested} samples but only {available} available")]
    CapacityExceeded { requested: usize, available: usize },

    #[error("truncated read: expected {expected} samples, got {actual}")]
    TruncatedRead { expected: usize, actual: usize },

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("source missing: {0}")]
    SourceMissing(String),

    #[error("destination exists: {0}")]
    DestinationExists(String),

    #[error("write error: {0}")]
    WriteError(String),

    #[error("driver error: {0}")]
    DriverError(String),

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("capture already running")]
    AlreadyRunning,

    #[error("storage error: {0}")]
    StorageError(String),
}
