//! Point-in-time cache statistics.

use serde::{Deserialize, Serialize};

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Occupied slots, expired or not
    pub total_entries: usize,
    /// Slots whose entry has expired but was not reclaimed yet
    pub expired_entries: usize,
    /// Slots still within their ttl
    pub live_entries: usize,
    /// Maximum number of slots
    pub capacity: usize,
    /// Successful adds since construction
    pub added: u64,
    /// Addresses handed out by `take`
    pub taken: u64,
    /// Successful removes
    pub removed: u64,
    /// Slots discarded because their entry expired
    pub expired: u64,
    /// Rejected adds
    pub rejected: u64,
}

impl CacheStats {
    /// Fraction of capacity in use, between 0.0 and 1.0.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.total_entries as f64 / self.capacity as f64
    }
}
