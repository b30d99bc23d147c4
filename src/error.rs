//! Error types shared by all indexes.

use thiserror::Error;

/// Errors reported by index construction and insertion.
///
/// Querying an empty index is never an error; it simply yields no matches.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    /// An insert was attempted after the index was built (frozen).
    #[error("cannot insert: the index has already been built")]
    UseAfterFreeze,

    /// An interval key with `min > max` (or a NaN bound).
    #[error("invalid interval: min {min} is not <= max {max}")]
    InvalidInterval {
        /// Lower bound as supplied.
        min: f64,
        /// Upper bound as supplied.
        max: f64,
    },

    /// An envelope with an inverted (or NaN) extent on some axis.
    #[error("invalid envelope: ({min_x}, {min_y}) .. ({max_x}, {max_y})")]
    InvalidEnvelope {
        /// Minimum x as supplied.
        min_x: f64,
        /// Minimum y as supplied.
        min_y: f64,
        /// Maximum x as supplied.
        max_x: f64,
        /// Maximum y as supplied.
        max_y: f64,
    },

    /// A snap tolerance that is negative or not finite.
    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    /// A node capacity (fan-out) of zero.
    #[error("node capacity must be at least 1, got {0}")]
    InvalidNodeCapacity(usize),

    /// A Hilbert curve order outside `1..=16`.
    #[error("hilbert order must be in 1..=16, got {0}")]
    InvalidHilbertOrder(u32),
}

/// Result alias used throughout the crate.
pub type Result<T, E = IndexError> = std::result::Result<T, E>;
