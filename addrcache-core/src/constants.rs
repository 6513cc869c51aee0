//! Defaults and configuration keys.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Number of slots a cache gets when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Expiration used by [`CacheConfig::default`](crate::CacheConfig), in milliseconds.
pub const DEFAULT_TTL_MS: u64 = 60_000;

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Expiration in milliseconds.
pub const ENV_TTL_MS: &str = "ADDRCACHE_TTL_MS";

/// Maximum number of slots.
pub const ENV_CAPACITY: &str = "ADDRCACHE_CAPACITY";

/// Duplicate policy: `reject` or `allow`.
pub const ENV_DUPLICATES: &str = "ADDRCACHE_DUPLICATES";

/// Reclaim expired slots when full: anything but `false` / `0` enables it.
pub const ENV_AUTO_CLEANUP: &str = "ADDRCACHE_AUTO_CLEANUP";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_positive() {
        assert_eq!(DEFAULT_CAPACITY, 10_000);
        assert!(DEFAULT_TTL_MS > 0);
    }

    #[test]
    fn test_env_keys_unique() {
        let keys = [ENV_TTL_MS, ENV_CAPACITY, ENV_DUPLICATES, ENV_AUTO_CLEANUP];
        for (i, a) in keys.iter().enumerate() {
            for (j, b) in keys.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }
}
