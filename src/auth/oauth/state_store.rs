//! Pending-authorization state store.
//!
//! Maps a shop hostname to the nonce issued when that shop started the flow.
//! The store is bounded both in size and in time:
//!
//! - at most [`DEFAULT_CAPACITY`] entries; inserting beyond that evicts the
//!   least recently used entry
//! - entries older than [`DEFAULT_TTL`] are treated as absent and dropped on
//!   access
//!
//! All operations take one mutex for O(1) work, so the store can be shared
//! freely between concurrent requests.
//!
//! # Example
//!
//! ```rust
//! use shopify_oauth::auth::oauth::StateStore;
//!
//! let store = StateStore::default();
//! store.put("a.myshopify.com", "n1");
//! assert_eq!(store.get("a.myshopify.com").as_deref(), Some("n1"));
//! ```

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::auth::oauth::hmac::constant_time_compare;

/// Default maximum number of pending authorizations.
pub const DEFAULT_CAPACITY: usize = 5000;

/// Default lifetime of a pending authorization (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Source of the current instant for expiry checks.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct PendingAuthorization {
    nonce: String,
    issued_at: Instant,
}

/// Bounded, expiring map from shop hostname to issued nonce.
pub struct StateStore {
    entries: Mutex<LruCache<String, PendingAuthorization>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

// Verify StateStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateStore>();
};

impl StateStore {
    /// Creates a store with the given bounds using the system clock.
    #[must_use]
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    /// Creates a store with the given bounds and clock.
    #[must_use]
    pub fn with_clock(capacity: NonZeroUsize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            clock,
        }
    }

    /// Records `nonce` as the pending state for `shop`, replacing any earlier
    /// nonce for the same shop.
    pub fn put(&self, shop: &str, nonce: impl Into<String>) {
        let entry = PendingAuthorization {
            nonce: nonce.into(),
            issued_at: self.clock.now(),
        };

        let evicted = self.lock().push(shop.to_string(), entry);
        if let Some((evicted_shop, _)) = evicted {
            if evicted_shop != shop {
                tracing::debug!(shop = %evicted_shop, "Evicted pending authorization at capacity");
            }
        }
    }

    /// Returns the pending nonce for `shop`, if one exists and has not expired.
    ///
    /// A hit marks the entry as recently used.
    #[must_use]
    pub fn get(&self, shop: &str) -> Option<String> {
        let now = self.clock.now();
        let mut entries = self.lock();

        match entries.get(shop) {
            None => return None,
            Some(entry) if !self.is_expired(entry, now) => return Some(entry.nonce.clone()),
            Some(_) => {}
        }

        entries.pop(shop);
        tracing::debug!(shop, "Pending authorization expired");
        None
    }

    /// Removes the pending nonce for `shop` if it equals `state`.
    ///
    /// Comparison and removal happen under one lock, so a nonce can be
    /// consumed by at most one callback. A non-matching entry is left in place.
    #[must_use]
    pub fn take_matching(&self, shop: &str, state: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.lock();

        let Some(entry) = entries.peek(shop) else {
            return false;
        };
        let matches = !self.is_expired(entry, now) && constant_time_compare(&entry.nonce, state);

        if matches {
            entries.pop(shop);
        }
        matches
    }

    /// Returns the number of stored entries, including any not yet purged
    /// after expiry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.lock().cap()
    }

    fn is_expired(&self, entry: &PendingAuthorization, now: Instant) -> bool {
        now.saturating_duration_since(entry.issued_at) >= self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, PendingAuthorization>> {
        // Entries stay consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(
            NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            DEFAULT_TTL,
        )
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
