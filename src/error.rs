/*
 * Error Module
 *
 * Errors surfaced by the flocking engine. Configuration and capacity problems
 * are fatal to the caller; per-agent numerical edge cases never reach here.
 */

use thiserror::Error;

/// Errors emitted while configuring or stepping a flock.
#[derive(Debug, Error)]
pub enum FlockError {
    /// A configuration value that cannot be used (e.g. non-positive cell size).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// More agents than the spatial index was sized for.
    #[error("population of {requested} exceeds capacity of {capacity} agents")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T, E = FlockError> = std::result::Result<T, E>;
