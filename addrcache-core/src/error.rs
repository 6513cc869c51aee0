//! Error types for the address cache.
//!
//! Only configuration problems are hard failures. Rejections from `add` are
//! modelled as errors so callers that care can see the reason, while the
//! boolean API simply reports `false`.

use thiserror::Error;

/// Result type alias using `CacheError`.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Main error type for all cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Non-positive ttl or capacity, or an unparseable configuration source.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INSERT REJECTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Every slot is occupied.
    #[error("Cache is full: capacity {capacity} reached")]
    CapacityExceeded {
        /// Configured number of slots
        capacity: usize,
    },

    /// The address already has a live occurrence.
    #[error("Address is already cached")]
    Duplicate,

    /// The cache was closed and accepts no new addresses.
    #[error("Cache is closed")]
    Closed,
}

impl CacheError {
    /// Returns true if this error was raised while building a cache.
    pub fn is_config_error(&self) -> bool {
        matches!(self, CacheError::InvalidConfig(_))
    }

    /// Returns true if this error is a non-fatal `add` rejection.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CacheError::CapacityExceeded { .. } | CacheError::Duplicate | CacheError::Closed
        )
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::InvalidConfig(err.to_string())
    }
}
