//! Transit-time cache capability and an in-memory TTL implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default lifetime of a cached transit time.
pub const TRANSIT_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
/// Default period between sweeps of expired entries.
pub const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Keyed string store with per-entry expiry.
///
/// Entries are immutable once written; writing the same key again overwrites it.
pub trait TransitCache: Send + Sync {
    /// Returns the live value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key` for `ttl`.
    fn put(&self, key: &str, value: String, ttl: Duration);
}

/// Cache key for an (origin, destination) pair.
///
/// Each part is trimmed, lowercased, and has whitespace runs collapsed to `_`.
pub fn cache_key(origin: &str, destination: &str) -> String {
    format!("transit_{}_to_{}", normalize(origin), normalize(destination))
}

fn normalize(part: &str) -> String {
    part.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Entry {
    value: String,
    expires_at: Instant,
}

struct Store {
    entries: HashMap<String, Entry>,
    next_sweep: Instant,
}

impl Store {
    fn purge(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before - self.entries.len()
    }
}

/// Process-wide in-memory [`TransitCache`].
///
/// Expired entries are dropped on read, by a full sweep at most once per sweep interval
/// during writes, and by [`MemoryCache::purge_expired`] (see [`MemoryCache::spawn_sweeper`]).
pub struct MemoryCache {
    store: Mutex<Store>,
    clock: Arc<dyn Clock>,
    sweep_interval: Duration,
}

impl MemoryCache {
    /// Cache backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Cache backed by a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            store: Mutex::new(Store {
                entries: HashMap::new(),
                next_sweep: now + CACHE_SWEEP_INTERVAL,
            }),
            clock,
            sweep_interval: CACHE_SWEEP_INTERVAL,
        }
    }

    /// Change how often writes trigger a full sweep.
    pub fn with_sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = every;
        let now = self.clock.now();
        self.lock().next_sweep = now + every;
        self
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.lock().purge(now)
    }

    /// Purge expired entries every `every` on the current tokio runtime.
    ///
    /// The task holds a weak handle and exits once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let every = every.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = cache.len(), "transit cache swept");
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries_len", &self.len())
            .finish()
    }
}

impl TransitCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let mut store = self.lock();
        match store.entries.get(key) {
            Some(e) if e.expires_at > now => Some(e.value.clone()),
            Some(_) => {
                store.entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, value: String, ttl: Duration) {
        let now = self.clock.now();
        let mut store = self.lock();
        if now >= store.next_sweep {
            store.purge(now);
            store.next_sweep = now + self.sweep_interval;
        }
        store.entries.insert(key.to_string(), Entry { value, expires_at: now + ttl });
    }
}
