//! Short-lived cache for derived sensor data.
//!
//! Expensive sensors (camera frames, raycast fans) often derive values other
//! sensors or observation providers want too.  Entries expire `ttl_secs`
//! after they were stored, measured on the sensor manager's simulated clock.

use std::any::Any;

use rustc_hash::FxHashMap;

struct CacheEntry {
    value:     Box<dyn Any>,
    stored_at: f64,
}

/// String-keyed TTL cache.  Expired entries are invisible to reads and are
/// dropped by [`evict_expired`](Self::evict_expired).
pub struct SensorCache {
    entries:  FxHashMap<String, CacheEntry>,
    ttl_secs: f64,
    now_secs: f64,
}

impl SensorCache {
    pub fn new(ttl_secs: f64) -> Self {
        Self {
            entries:  FxHashMap::default(),
            ttl_secs: ttl_secs.max(0.0),
            now_secs: 0.0,
        }
    }

    /// Move the cache's notion of "now".  Time never goes backwards.
    pub fn set_clock(&mut self, now_secs: f64) {
        if now_secs > self.now_secs {
            self.now_secs = now_secs;
        }
    }

    pub fn now_secs(&self) -> f64 {
        self.now_secs
    }

    pub fn ttl_secs(&self) -> f64 {
        self.ttl_secs
    }

    pub fn insert<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(
            key.into(),
            CacheEntry { value: Box::new(value), stored_at: self.now_secs },
        );
    }

    /// The value under `key` if it is fresh and a `T`.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        let entry = self.entries.get(key)?;
        if self.is_expired(entry) {
            return None;
        }
        entry.value.downcast_ref::<T>()
    }

    /// Seconds since `key` was stored, if present (fresh or not).
    pub fn age_secs(&self, key: &str) -> Option<f64> {
        self.entries.get(key).map(|e| self.now_secs - e.stored_at)
    }

    /// Drop every expired entry.  Returns how many were removed.
    pub fn evict_expired(&mut self) -> usize {
        let before = self.entries.len();
        let (now, ttl) = (self.now_secs, self.ttl_secs);
        self.entries.retain(|_, e| now - e.stored_at <= ttl);
        before - self.entries.len()
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.now_secs - entry.stored_at > self.ttl_secs
    }
}

impl Default for SensorCache {
    fn default() -> Self {
        Self::new(0.1)
    }
}
