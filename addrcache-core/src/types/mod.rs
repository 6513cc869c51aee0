//! Domain types for the address cache.
//!
//! - [`CacheConfig`]: ttl, capacity and policies fixed at construction
//! - [`DuplicatePolicy`]: how `add` treats an address that is already cached

mod config;

pub use config::*;
