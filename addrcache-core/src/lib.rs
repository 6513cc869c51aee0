//! # addrcache core
//!
//! Shared building blocks for the bounded, expiring address cache:
//!
//! - **Errors**: the [`CacheError`] hierarchy and [`Result`] alias
//! - **Constants**: defaults and environment variable names
//! - **Traits**: the [`Clock`] time source with system and mock implementations
//! - **Types**: cache configuration and duplicate handling policy
//!
//! ## Example
//!
//! ```rust
//! use addrcache_core::{CacheConfig, DuplicatePolicy};
//!
//! let config = CacheConfig::new(100, 16).with_duplicates(DuplicatePolicy::Allow);
//! assert!(config.validate().is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
