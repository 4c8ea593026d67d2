/// Domain-specific error types for memsentry using thiserror
///
/// Runtime paths (sampling, subscriber fan-out, cache admission) never
/// surface through this enum; they degrade to logged fallbacks or boolean
/// results. These variants cover construction and lifecycle seams only.
use thiserror::Error;

/// Convenience result alias for memsentry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for memsentry operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cache '{name}' already exists with a different value type")]
    CacheTypeMismatch { name: String },

    #[error("memory monitor is already running")]
    AlreadyRunning,

    #[error("memory monitor is not running")]
    NotRunning,
}
