//! Bounded, expiring, insertion-ordered address cache.

use std::fmt::Debug;
use std::hash::Hash;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;
use tracing::{debug, info, instrument, warn};

use addrcache_core::{
    CacheConfig, CacheError, Clock, DuplicatePolicy, Result, SystemClock, DEFAULT_CAPACITY,
};

use crate::state::CacheState;
use crate::stats::CacheStats;

/// Address cache keyed by IP address.
pub type IpAddressCache<C = SystemClock> = AddressCache<IpAddr, C>;

/// Fixed-capacity cache of addresses with time-based expiration.
///
/// Addresses come out of [`take`](Self::take) in insertion order. Expired
/// slots are discarded lazily while `take` scans the front of the queue, or
/// eagerly through [`purge_expired`](Self::purge_expired).
///
/// # Thread Safety
///
/// All operations take `&self` and may be called from any number of threads
/// or tasks; share the cache through an `Arc`. The queue and the expiration
/// map sit behind a single mutex and are always updated together.
///
/// # Example
///
/// ```
/// use std::net::IpAddr;
/// use std::time::Duration;
/// use addrcache::AddressCache;
///
/// let cache: AddressCache<IpAddr> = AddressCache::new(Duration::from_secs(30)).unwrap();
/// let addr: IpAddr = "127.0.0.1".parse().unwrap();
///
/// assert!(cache.add(addr));
/// assert_eq!(cache.peek(), Some(addr));
/// assert_eq!(cache.take(), Some(addr));
/// ```
pub struct AddressCache<A, C = SystemClock> {
    state: Mutex<CacheState<A>>,
    /// Wakes blocking takers
    available: Condvar,
    /// Wakes async takers
    notify: Notify,
    config: CacheConfig,
    ttl: Duration,
    clock: C,
}

impl<A> AddressCache<A, SystemClock>
where
    A: Eq + Hash + Clone + Debug,
{
    /// Creates a cache with the default capacity of 10 000 slots.
    pub fn new(ttl: Duration) -> Result<Self> {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    /// Creates a cache with the given ttl and capacity.
    ///
    /// The ttl is used exactly as given; the reported config rounds it up to
    /// whole milliseconds.
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Result<Self> {
        Self::build(CacheConfig::with_ttl(ttl, capacity), ttl, SystemClock)
    }

    /// Creates a cache from a full configuration.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<A, C> AddressCache<A, C>
where
    A: Eq + Hash + Clone + Debug,
    C: Clock,
{
    /// Creates a cache that reads time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: C) -> Result<Self> {
        config.validate()?;
        let ttl = config.ttl();
        Self::build(config, ttl, clock)
    }

    fn build(config: CacheConfig, ttl: Duration, clock: C) -> Result<Self> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "ttl must be greater than zero".into(),
            ));
        }
        if config.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than zero".into(),
            ));
        }

        Ok(Self {
            state: Mutex::new(CacheState::new()),
            available: Condvar::new(),
            notify: Notify::new(),
            ttl,
            config,
            clock,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INSERT / REMOVE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Adds an address. Returns false if it was rejected.
    ///
    /// Never waits for space; see [`try_add`](Self::try_add) for the reason
    /// of a rejection.
    pub fn add(&self, address: A) -> bool {
        self.try_add(address).is_ok()
    }

    /// Adds an address, reporting why it was rejected.
    ///
    /// # Errors
    /// - [`CacheError::Closed`] after [`close`](Self::close)
    /// - [`CacheError::Duplicate`] if the address is live and duplicates are rejected
    /// - [`CacheError::CapacityExceeded`] if every slot is occupied
    pub fn try_add(&self, address: A) -> Result<()> {
        let mut state = self.state.lock();
        let now = self.clock.now();

        if state.closed {
            state.counters.rejected += 1;
            warn!(?address, "Cache is closed, rejecting address");
            return Err(CacheError::Closed);
        }

        if self.config.duplicates == DuplicatePolicy::Reject
            && state.has_live(&address, now, self.ttl)
        {
            state.counters.rejected += 1;
            debug!(?address, "Address already cached, ignoring");
            return Err(CacheError::Duplicate);
        }

        if self.config.auto_cleanup && state.order.len() >= self.config.capacity {
            let purged = state.purge_expired(now, self.ttl);
            if purged > 0 {
                info!(purged, "Reclaimed expired slots on full cache");
            }
        }

        if state.order.len() >= self.config.capacity {
            state.counters.rejected += 1;
            warn!(?address, capacity = self.config.capacity, "Cache is full, cannot add");
            return Err(CacheError::CapacityExceeded {
                capacity: self.config.capacity,
            });
        }

        debug!(?address, "Adding address");
        state.push(address, now);
        drop(state);

        self.available.notify_one();
        self.notify.notify_one();
        Ok(())
    }

    /// Removes the oldest occurrence of an address.
    ///
    /// When duplicates are rejected, expired occurrences of the address are
    /// dropped first, so the live one is the occurrence removed.
    ///
    /// Returns true only if the address occupied a slot.
    pub fn remove(&self, address: &A) -> bool {
        let mut state = self.state.lock();

        let mut expired = 0;
        if self.config.duplicates == DuplicatePolicy::Reject {
            expired = state.purge_expired_of(address, self.clock.now(), self.ttl);
            if expired > 0 {
                info!(?address, expired, "Dropped expired occurrences before remove");
            }
        }

        let removed = state.remove_oldest(address);
        if removed {
            debug!(?address, "Removed address");
        }
        removed || expired > 0
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // READ
    // ═══════════════════════════════════════════════════════════════════════════

    /// Returns the oldest occupied slot without removing it.
    ///
    /// No expiration check is made, so the address may already be expired.
    pub fn peek(&self) -> Option<A> {
        self.state.lock().order.front().cloned()
    }

    /// Removes and returns the oldest live address, waiting until one is added.
    ///
    /// Returns `None` once the cache is closed and holds no live address.
    #[instrument(skip(self), level = "debug")]
    pub fn take(&self) -> Option<A> {
        let mut state = self.state.lock();
        loop {
            if let Some(address) = self.next_live(&mut state) {
                return Some(address);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Like [`take`](Self::take), but gives up after `timeout`.
    ///
    /// The deadline is measured on the real monotonic clock. A wait that
    /// times out consumes nothing. A timeout too large to represent as a
    /// deadline waits without one.
    #[instrument(skip(self), level = "debug")]
    pub fn take_timeout(&self, timeout: Duration) -> Option<A> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.take();
        };
        let mut state = self.state.lock();
        loop {
            if let Some(address) = self.next_live(&mut state) {
                return Some(address);
            }
            if state.closed {
                return None;
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return self.next_live(&mut state);
            }
        }
    }

    /// Async version of [`take`](Self::take).
    ///
    /// Dropping the returned future cancels the wait without consuming an
    /// address, so it composes with `tokio::time::timeout` and `select!`.
    pub async fn take_async(&self) -> Option<A> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking state so an add in between is not missed.
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(address) = self.next_live(&mut state) {
                    return Some(address);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Pops slots until a live one is found, discarding stale ones.
    fn next_live(&self, state: &mut CacheState<A>) -> Option<A> {
        let now = self.clock.now();

        while let Some(address) = state.order.pop_front() {
            match state.pop_entry(&address) {
                None => {
                    warn!(?address, "Slot without a tracked entry, discarding");
                }
                Some(entry) if entry.is_expired(now, self.ttl) => {
                    state.counters.expired += 1;
                    info!(
                        address = ?entry.address,
                        age_ms = entry.age(now).as_millis() as u64,
                        "Removing expired address"
                    );
                }
                Some(_) => {
                    state.counters.taken += 1;
                    debug!(?address, "Took address");
                    return Some(address);
                }
            }
        }

        None
    }

    /// True if the address has a live occurrence.
    pub fn contains(&self, address: &A) -> bool {
        self.state.lock().has_live(address, self.clock.now(), self.ttl)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MAINTENANCE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Reclaims every expired slot now. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let purged = self.state.lock().purge_expired(self.clock.now(), self.ttl);
        if purged > 0 {
            info!(purged, "Purged expired addresses");
        }
        purged
    }

    /// Drops every slot.
    pub fn clear(&self) {
        self.state.lock().clear();
    }

    /// Stops accepting addresses and wakes every waiting taker.
    ///
    /// Takers drain what is still live, then get `None` instead of waiting.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        info!("Address cache closed");
        self.available.notify_all();
        self.notify.notify_waiters();
    }

    /// Returns true after [`close`](Self::close).
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INSPECTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Number of occupied slots, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.state.lock().order.len()
    }

    /// Returns true if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.state.lock().order.is_empty()
    }

    /// Maximum number of slots.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Expiration duration.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The configuration the cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let total = state.order.len();
        let expired = state.count_expired(self.clock.now(), self.ttl);
        let c = state.counters;

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            live_entries: total.saturating_sub(expired),
            capacity: self.config.capacity,
            added: c.added,
            taken: c.taken,
            removed: c.removed,
            expired: c.expired,
            rejected: c.rejected,
        }
    }
}
