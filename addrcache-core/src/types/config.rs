//! Cache configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CAPACITY, DEFAULT_TTL_MS, ENV_AUTO_CLEANUP, ENV_CAPACITY, ENV_DUPLICATES, ENV_TTL_MS,
};
use crate::error::{CacheError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// DUPLICATE POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// What `add` does with an address that already has a live occurrence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Refuse the insert until the existing occurrence is taken, removed or expired.
    #[default]
    Reject,
    /// Give every insert its own slot with independent expiration.
    Allow,
}

impl FromStr for DuplicatePolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "allow" => Ok(Self::Allow),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown duplicate policy '{other}', expected 'reject' or 'allow'"
            ))),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("reject"),
            Self::Allow => f.write_str("allow"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Cache configuration.
///
/// Fixed for the lifetime of a cache once it has been built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time an address stays live after insertion, in milliseconds
    pub ttl_ms: u64,
    /// Maximum number of occupied slots
    pub capacity: usize,
    /// Handling of addresses that are already cached
    pub duplicates: DuplicatePolicy,
    /// Whether a full cache reclaims expired slots before rejecting an add
    pub auto_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            capacity: DEFAULT_CAPACITY,
            duplicates: DuplicatePolicy::Reject,
            auto_cleanup: true,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with the given ttl and capacity.
    pub fn new(ttl_ms: u64, capacity: usize) -> Self {
        Self {
            ttl_ms,
            capacity,
            ..Self::default()
        }
    }

    /// Creates a configuration from a [`Duration`] ttl.
    ///
    /// `ttl_ms` is rounded up to the next whole millisecond, so any positive
    /// ttl stays valid.
    pub fn with_ttl(ttl: Duration, capacity: usize) -> Self {
        let partial = u128::from(ttl.subsec_nanos() % 1_000_000 != 0);
        let ms = u64::try_from(ttl.as_millis() + partial).unwrap_or(u64::MAX);
        Self::new(ms, capacity)
    }

    /// Sets the duplicate policy.
    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Enables or disables reclaiming expired slots on a full cache.
    pub fn with_auto_cleanup(mut self, auto_cleanup: bool) -> Self {
        self.auto_cleanup = auto_cleanup;
        self
    }

    /// Expiration as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Checks that ttl and capacity are positive.
    pub fn validate(&self) -> Result<()> {
        if self.ttl_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "ttl must be greater than zero".into(),
            ));
        }
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from the environment, loading `.env` first.
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TTL_MS) {
            config.ttl_ms = parse_number(ENV_TTL_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CAPACITY) {
            config.capacity = parse_number(ENV_CAPACITY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DUPLICATES) {
            config.duplicates = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_AUTO_CLEANUP) {
            let raw = raw.trim();
            config.auto_cleanup = raw != "false" && raw != "0";
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| CacheError::InvalidConfig(format!("{key}: '{raw}' is not a valid number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.ttl(), Duration::from_millis(DEFAULT_TTL_MS));
        assert_eq!(config.duplicates, DuplicatePolicy::Reject);
        assert!(config.auto_cleanup);
        assert!(config.validate().is_ok());
    }

    #[test_case(0, 10 ; "zero ttl")]
    #[test_case(100, 0 ; "zero capacity")]
    #[test_case(0, 0 ; "both zero")]
    fn test_validate_rejects(ttl_ms: u64, capacity: usize) {
        let err = CacheConfig::new(ttl_ms, capacity).validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test_case(Duration::from_millis(100), 100 ; "whole millis")]
    #[test_case(Duration::from_micros(100_900), 101 ; "partial millis round up")]
    #[test_case(Duration::from_micros(500), 1 ; "sub millisecond")]
    #[test_case(Duration::ZERO, 0 ; "zero")]
    fn test_with_ttl_rounds_up_to_millis(ttl: Duration, expected_ms: u64) {
        let config = CacheConfig::with_ttl(ttl, 5);
        assert_eq!(config.ttl_ms, expected_ms);
        assert_eq!(config.capacity, 5);
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(ENV_TTL_MS, "750");
        std::env::set_var(ENV_CAPACITY, "64");
        let config = CacheConfig::from_env();
        std::env::remove_var(ENV_TTL_MS);
        std::env::remove_var(ENV_CAPACITY);

        let config = config.unwrap();
        assert_eq!(config.ttl_ms, 750);
        assert_eq!(config.capacity, 64);
    }

    #[test_case("reject", DuplicatePolicy::Reject)]
    #[test_case("ALLOW", DuplicatePolicy::Allow)]
    #[test_case(" allow ", DuplicatePolicy::Allow)]
    fn test_duplicate_policy_parse(raw: &str, expected: DuplicatePolicy) {
        assert_eq!(raw.parse::<DuplicatePolicy>().unwrap(), expected);
    }

    #[test]
    fn test_duplicate_policy_parse_unknown() {
        assert!("sometimes".parse::<DuplicatePolicy>().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = CacheConfig::from_json(r#"{"ttl_ms": 100, "duplicates": "allow"}"#).unwrap();
        assert_eq!(config.ttl_ms, 100);
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.duplicates, DuplicatePolicy::Allow);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(CacheConfig::from_json("not json").is_err());
        assert!(CacheConfig::from_json(r#"{"capacity": 0}"#).is_err());
    }

    #[test]
    fn test_json_roundtrip_uses_lowercase_policy() {
        let json = serde_json::to_string(&CacheConfig::default()).unwrap();
        assert!(json.contains("\"reject\""));
    }

    #[test]
    fn test_from_lookup() {
        let config = CacheConfig::from_lookup(lookup(&[
            (ENV_TTL_MS, "250"),
            (ENV_CAPACITY, "32"),
            (ENV_DUPLICATES, "allow"),
            (ENV_AUTO_CLEANUP, "0"),
        ]))
        .unwrap();

        assert_eq!(config.ttl_ms, 250);
        assert_eq!(config.capacity, 32);
        assert_eq!(config.duplicates, DuplicatePolicy::Allow);
        assert!(!config.auto_cleanup);
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = CacheConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test_case(ENV_TTL_MS, "soon" ; "non numeric ttl")]
    #[test_case(ENV_TTL_MS, "0" ; "zero ttl")]
    #[test_case(ENV_CAPACITY, "-1" ; "negative capacity")]
    #[test_case(ENV_DUPLICATES, "maybe" ; "unknown policy")]
    fn test_from_lookup_rejects(key: &str, value: &str) {
        let err = CacheConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
        assert!(err.is_config_error());
    }
}
