//! The lock-protected state shared by every cache operation.
//!
//! `order` and `entries` are only ever touched together, under one mutex.
//! For every address the number of its slots in `order` equals the length of
//! its entry list, and the i-th slot pairs with the i-th entry.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// One tracked occurrence of an address.
#[derive(Clone, Debug)]
pub(crate) struct AddressEntry<A> {
    pub(crate) address: A,
    pub(crate) inserted_at: Instant,
}

impl<A> AddressEntry<A> {
    pub(crate) fn new(address: A, inserted_at: Instant) -> Self {
        Self {
            address,
            inserted_at,
        }
    }

    pub(crate) fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    pub(crate) fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }
}

/// Cumulative counters, updated under the state lock.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Counters {
    pub(crate) added: u64,
    pub(crate) taken: u64,
    pub(crate) removed: u64,
    pub(crate) expired: u64,
    pub(crate) rejected: u64,
}

#[derive(Debug)]
pub(crate) struct CacheState<A> {
    /// Occupied slots, oldest first
    pub(crate) order: VecDeque<A>,
    /// Address → occurrences, oldest first
    pub(crate) entries: HashMap<A, VecDeque<AddressEntry<A>>>,
    pub(crate) closed: bool,
    pub(crate) counters: Counters,
}

impl<A> CacheState<A>
where
    A: Eq + Hash + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            order: VecDeque::new(),
            entries: HashMap::new(),
            closed: false,
            counters: Counters::default(),
        }
    }

    /// Occupies a new slot for `address`.
    pub(crate) fn push(&mut self, address: A, now: Instant) {
        self.entries
            .entry(address.clone())
            .or_default()
            .push_back(AddressEntry::new(address.clone(), now));
        self.order.push_back(address);
        self.counters.added += 1;
    }

    /// Pops the oldest entry of `address`, dropping the key once its list is empty.
    pub(crate) fn pop_entry(&mut self, address: &A) -> Option<AddressEntry<A>> {
        let list = self.entries.get_mut(address)?;
        let entry = list.pop_front();
        if list.is_empty() {
            self.entries.remove(address);
        }
        entry
    }

    /// Frees the oldest slot of `address`. Returns false if it has none.
    pub(crate) fn remove_oldest(&mut self, address: &A) -> bool {
        let Some(pos) = self.order.iter().position(|a| a == address) else {
            return false;
        };
        self.order.remove(pos);
        self.pop_entry(address);
        self.counters.removed += 1;
        true
    }

    /// True if `address` has an occurrence younger than `ttl`.
    pub(crate) fn has_live(&self, address: &A, now: Instant, ttl: Duration) -> bool {
        self.entries
            .get(address)
            .and_then(|list| list.back())
            .is_some_and(|entry| !entry.is_expired(now, ttl))
    }

    /// Number of slots whose entry has expired but was not reclaimed yet.
    pub(crate) fn count_expired(&self, now: Instant, ttl: Duration) -> usize {
        self.entries
            .values()
            .map(|list| list.iter().take_while(|e| e.is_expired(now, ttl)).count())
            .sum()
    }

    /// Drops the expired occurrences of one address from both structures.
    pub(crate) fn purge_expired_of(&mut self, address: &A, now: Instant, ttl: Duration) -> usize {
        let mut n = 0;
        while self
            .entries
            .get(address)
            .and_then(|list| list.front())
            .is_some_and(|e| e.is_expired(now, ttl))
        {
            self.pop_entry(address);
            n += 1;
        }
        if n == 0 {
            return 0;
        }

        let mut left = n;
        self.order.retain(|a| {
            if left > 0 && a == address {
                left -= 1;
                false
            } else {
                true
            }
        });

        self.counters.expired += n as u64;
        n
    }

    /// Reclaims every expired slot and returns how many were dropped.
    ///
    /// Entries are ordered by insertion, so the expired ones of an address
    /// are a prefix of its list and pair with its first slots in `order`.
    pub(crate) fn purge_expired(&mut self, now: Instant, ttl: Duration) -> usize {
        let mut dropped: HashMap<A, usize> = HashMap::new();

        self.entries.retain(|address, list| {
            let mut n = 0;
            while list.front().is_some_and(|e| e.is_expired(now, ttl)) {
                list.pop_front();
                n += 1;
            }
            if n > 0 {
                dropped.insert(address.clone(), n);
            }
            !list.is_empty()
        });

        if dropped.is_empty() {
            return 0;
        }

        let before = self.order.len();
        self.order.retain(|address| match dropped.get_mut(address) {
            Some(n) if *n > 0 => {
                *n -= 1;
                false
            }
            _ => true,
        });

        let purged = before - self.order.len();
        self.counters.expired += purged as u64;
        purged
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_millis(100);

    fn slots(state: &CacheState<&'static str>) -> Vec<&'static str> {
        state.order.iter().copied().collect()
    }

    #[test]
    fn test_push_keeps_slots_and_entries_paired() {
        let now = Instant::now();
        let mut state = CacheState::new();
        state.push("a", now);
        state.push("b", now);
        state.push("a", now + Duration::from_millis(1));

        assert_eq!(slots(&state), vec!["a", "b", "a"]);
        assert_eq!(state.entries["a"].len(), 2);
        assert_eq!(state.entries["b"].len(), 1);
        assert_eq!(state.counters.added, 3);
    }

    #[test]
    fn test_pop_entry_drops_empty_key() {
        let mut state = CacheState::new();
        state.push("a", Instant::now());
        assert!(state.pop_entry(&"a").is_some());
        assert!(!state.entries.contains_key("a"));
        assert!(state.pop_entry(&"a").is_none());
    }

    #[test]
    fn test_remove_oldest() {
        let start = Instant::now();
        let mut state = CacheState::new();
        state.push("a", start);
        state.push("b", start);
        state.push("a", start + Duration::from_millis(5));

        assert!(state.remove_oldest(&"a"));
        assert_eq!(slots(&state), vec!["b", "a"]);
        assert_eq!(state.entries["a"][0].inserted_at, start + Duration::from_millis(5));
        assert!(!state.remove_oldest(&"zzz"));
        assert_eq!(state.counters.removed, 1);
    }

    #[test]
    fn test_has_live_checks_newest_occurrence() {
        let start = Instant::now();
        let mut state = CacheState::new();
        state.push("a", start);

        assert!(state.has_live(&"a", start, TTL));
        assert!(!state.has_live(&"a", start + TTL, TTL));

        state.push("a", start + TTL);
        assert!(state.has_live(&"a", start + TTL, TTL));
        assert!(!state.has_live(&"b", start, TTL));
    }

    #[test]
    fn test_purge_expired_drops_oldest_slots_only() {
        let start = Instant::now();
        let later = start + Duration::from_millis(80);
        let mut state = CacheState::new();
        state.push("a", start);
        state.push("b", start);
        state.push("a", later);
        state.push("c", later);

        let now = start + Duration::from_millis(120);
        assert_eq!(state.count_expired(now, TTL), 2);
        assert_eq!(state.purge_expired(now, TTL), 2);

        assert_eq!(slots(&state), vec!["a", "c"]);
        assert_eq!(state.entries["a"].len(), 1);
        assert_eq!(state.entries["a"][0].inserted_at, later);
        assert!(!state.entries.contains_key("b"));
        assert_eq!(state.counters.expired, 2);
    }

    #[test]
    fn test_purge_expired_of_single_address() {
        let start = Instant::now();
        let mut state = CacheState::new();
        state.push("a", start);
        state.push("b", start);
        state.push("a", start + TTL);

        let now = start + TTL + Duration::from_millis(1);
        assert_eq!(state.purge_expired_of(&"a", now, TTL), 1);

        assert_eq!(slots(&state), vec!["b", "a"]);
        assert_eq!(state.entries["a"].len(), 1);
        assert_eq!(state.entries["a"][0].inserted_at, start + TTL);
        assert_eq!(state.entries["b"].len(), 1);
        assert_eq!(state.counters.expired, 1);
        assert_eq!(state.purge_expired_of(&"zzz", now, TTL), 0);
    }

    #[test]
    fn test_purge_expired_nothing_to_do() {
        let now = Instant::now();
        let mut state = CacheState::new();
        state.push("a", now);
        assert_eq!(state.purge_expired(now, TTL), 0);
        assert_eq!(slots(&state), vec!["a"]);
    }

    #[test]
    fn test_entry_age_saturates() {
        let now = Instant::now();
        let entry = AddressEntry::new("a", now + Duration::from_secs(1));
        assert_eq!(entry.age(now), Duration::ZERO);
        assert!(!entry.is_expired(now, TTL));
        assert_eq!(entry.address, "a");
    }
}
