//! Error types for the ephemeris engine.
//!
//! Construction-time problems (bad configuration, unreadable stores) are fatal and
//! surface as [`EphemerisError`]. Expected conditions on the query path, such as a
//! range that runs past the cached horizon, are reported through sentinel values
//! instead (see [`crate::services::cache::CacheLookup`]).

use crate::db::repository::RepositoryError;

/// Result type for engine operations.
pub type EphemerisResult<T> = Result<T, EphemerisError>;

/// Error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EphemerisError {
    /// Body configuration or engine settings are unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading or writing the persisted configuration failed.
    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),

    /// JSON (de)serialization failed outside the storage layer.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A requested time range cannot be built.
    #[error("Invalid range: start={start} stop={stop}")]
    InvalidRange { start: i64, stop: i64 },

    /// The position model produced a non-finite angle.
    #[error("Numerical fault at t={timestamp}: {message}")]
    NumericalFault { timestamp: i64, message: String },

    /// A chunk worker panicked; the batch it belonged to is abandoned.
    #[error("Chunk {chunk} panicked: {message}")]
    WorkerPanic { chunk: usize, message: String },

    /// A chunked build failed on every attempt.
    #[error("Parallel build failed after {attempts} attempt(s): {message}")]
    WorkerFailure { attempts: u32, message: String },

    /// The worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Filesystem error outside the storage layer (cache dumps).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EphemerisError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether a retry of the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NumericalFault { .. } | Self::WorkerPanic { .. } | Self::ThreadPool(_) => true,
            Self::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}
