//! Resolution cache: byte-bounded LRU with per-entry TTL and negative entries

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::RegistryResult;
use pkgcdn_core::error::CdnError;

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// Fresh value
    Hit(T),
    /// Fresh "confirmed absent" marker
    Negative,
    /// Nothing usable cached
    Miss,
}

/// Cache entry with expiry
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized value; `None` is the negative sentinel
    value: Option<String>,
    /// When the entry stops being served
    expires_at: Instant,
    /// Bytes charged against capacity
    size: usize,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Default)]
struct CacheState {
    /// Least recently used first
    entries: IndexMap<String, CacheEntry>,
    total_bytes: usize,
    hits: u64,
    negative_hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheState {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.shift_remove(key)?;
        self.total_bytes -= entry.size;
        Some(entry)
    }
}

/// In-memory cache shared by every request
#[derive(Debug)]
pub struct ResolutionCache {
    state: Mutex<CacheState>,
    /// Maximum total size of keys plus serialized values
    capacity_bytes: usize,
}

impl ResolutionCache {
    /// Create a cache holding at most `capacity_bytes` of keys and values
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity_bytes,
        }
    }

    /// Look up a key. Stale entries are dropped and reported as misses;
    /// values that no longer deserialize are treated the same way.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let entry = match state.entries.shift_remove(key) {
            Some(entry) if entry.is_fresh(now) => entry,
            Some(stale) => {
                state.total_bytes -= stale.size;
                state.misses += 1;
                return CacheLookup::Miss;
            }
            None => {
                state.misses += 1;
                return CacheLookup::Miss;
            }
        };

        let lookup = match &entry.value {
            None => CacheLookup::Negative,
            Some(serialized) => match serde_json::from_str(serialized) {
                Ok(value) => CacheLookup::Hit(value),
                Err(e) => {
                    warn!(key, error = %e, "dropping undecodable cache entry");
                    state.total_bytes -= entry.size;
                    state.misses += 1;
                    return CacheLookup::Miss;
                }
            },
        };

        match lookup {
            CacheLookup::Negative => state.negative_hits += 1,
            _ => state.hits += 1,
        }
        // Re-insert at the most recently used end
        state.entries.insert(key.to_string(), entry);

        lookup
    }

    /// Store a value for `ttl`
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> RegistryResult<()> {
        let serialized = serde_json::to_string(value).map_err(|e| CdnError::Io {
            message: format!("Failed to serialize cache value for {}", key),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        self.store(key, Some(serialized), ttl);
        Ok(())
    }

    /// Record that `key` was looked up and confirmed absent
    pub fn set_negative(&self, key: &str, ttl: Duration) {
        self.store(key, None, ttl);
    }

    fn store(&self, key: &str, value: Option<String>, ttl: Duration) {
        let size = key.len() + value.as_ref().map_or(0, String::len);
        let mut state = self.state.lock();

        state.remove(key);

        // An entry larger than the whole cache is never stored
        if size > self.capacity_bytes {
            return;
        }

        while state.total_bytes + size > self.capacity_bytes {
            match state.entries.shift_remove_index(0) {
                Some((_, evicted)) => {
                    state.total_bytes -= evicted.size;
                    state.evictions += 1;
                }
                None => break,
            }
        }

        state.total_bytes += size;
        state.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
                size,
            },
        );
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let state = self.state.lock();
        let fresh_entries = state.entries.values().filter(|entry| entry.is_fresh(now)).count();

        CacheStats {
            total_entries: state.entries.len(),
            fresh_entries,
            stale_entries: state.entries.len() - fresh_entries,
            total_bytes: state.total_bytes,
            capacity_bytes: self.capacity_bytes,
            hits: state.hits,
            negative_hits: state.negative_hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }

    /// Remove stale entries
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let before = state.entries.len();
        let mut freed = 0;

        state.entries.retain(|_, entry| {
            if entry.is_fresh(now) {
                true
            } else {
                freed += entry.size;
                false
            }
        });
        state.total_bytes -= freed;

        before - state.entries.len()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Number of fresh entries
    pub fresh_entries: usize,
    /// Number of stale entries not yet dropped
    pub stale_entries: usize,
    /// Bytes currently charged
    pub total_bytes: usize,
    pub capacity_bytes: usize,
    pub hits: u64,
    pub negative_hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[cfg(test)]
mod tests;
