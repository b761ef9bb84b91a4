// Error taxonomy for the collection and query paths.

use thiserror::Error;

/// Metric source unavailable or its output unparsable.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("failed to run metric command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("metric command exited with {status}")]
    CommandFailed { status: std::process::ExitStatus },

    #[error("failed to read {path}: {source}")]
    Io {
        path: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("metric source produced no output line")]
    NoOutput,

    #[error("missing {field} value in metric output")]
    MissingToken { field: &'static str },

    #[error("non-numeric {field} value `{token}` in metric output")]
    InvalidNumber { field: &'static str, token: String },

    #[error("malformed metric source: {0}")]
    Malformed(String),

    #[error("metric reader task failed: {0}")]
    Join(String),
}

/// A sample rejected before it reached storage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidDataError {
    #[error("Invalid CPU usage data: sample is absent")]
    Absent,

    #[error("Invalid CPU usage data: {field} is not a finite number")]
    NotFinite { field: &'static str },

    #[error("Invalid CPU usage data: {field} = {value} is outside [0, 100]")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Invalid CPU usage data: usage sum {sum} deviates from 100 by more than {tolerance}")]
    SumOutOfTolerance { sum: f64, tolerance: f64 },
}

/// Append or read against the sample store failed.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored row is corrupt: {0}")]
    Corrupt(String),

    #[error("sample store lock poisoned")]
    Poisoned,
}

/// Failure surfaced by the query service; always carries the store's cause.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct QueryError {
    message: String,
    #[source]
    source: StorageError,
}

impl QueryError {
    pub fn new(message: impl Into<String>, source: StorageError) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }

    pub fn cause(&self) -> &StorageError {
        &self.source
    }
}

/// Why a single collector tick wrote nothing.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    InvalidData(#[from] InvalidDataError),

    #[error("Failed to save CPU usage data: {0}")]
    Storage(#[from] StorageError),
}
