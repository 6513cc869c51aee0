//! # addrcache
//!
//! Fixed-capacity, thread-safe cache of network addresses with time-based
//! expiration.
//!
//! Addresses are handed out by [`AddressCache::take`] in insertion order.
//! Expired addresses are skipped lazily while scanning, and a full cache
//! rejects new addresses instead of waiting for space.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use addrcache::{CacheConfig, IpAddressCache};
//!
//! let cache: IpAddressCache = IpAddressCache::with_config(CacheConfig::new(100, 16)).unwrap();
//! cache.add("10.0.0.1".parse().unwrap());
//!
//! // Nothing else is coming, so give up quickly once the cache runs dry.
//! assert!(cache.take_timeout(Duration::from_millis(10)).is_some());
//! assert!(cache.take_timeout(Duration::from_millis(10)).is_none());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod state;
mod stats;

pub use cache::{AddressCache, IpAddressCache};
pub use stats::CacheStats;

// Re-export the configuration and clock types from core
pub use addrcache_core::{
    CacheConfig, CacheError, Clock, DuplicatePolicy, MockClock, Result, SystemClock,
};
