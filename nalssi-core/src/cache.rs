//! Short-lived response cache to conserve OpenWeather API quota.
//!
//! One slot per (city, units, language); a fresh fetch overwrites the slot
//! rather than appending. Entries past the TTL are simply ignored and
//! overwritten on the next store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::model::{Language, Units, WeatherQuery, WeatherResult};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Identifies a cache slot. City is trimmed and lowercased so that
/// "Seoul" and " seoul " share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    city: String,
    units: Units,
    language: Language,
}

impl From<&WeatherQuery> for CacheKey {
    fn from(query: &WeatherQuery) -> Self {
        Self {
            city: query.city().to_lowercase(),
            units: query.units,
            language: query.language,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: WeatherResult,
    fetched_at: Instant,
}

/// In-memory TTL cache owned by a client instance.
///
/// The mutex guards the read-check-write sequence when the host UI issues
/// concurrent callbacks; last writer wins, which is fine for idempotent
/// reads of current conditions.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached result for `key` if it is still within the TTL.
    pub fn lookup(&self, key: &CacheKey) -> Option<WeatherResult> {
        self.lookup_at(key, Instant::now())
    }

    /// TTL check against an explicit clock reading, so tests can age
    /// entries without sleeping.
    pub fn lookup_at(&self, key: &CacheKey, now: Instant) -> Option<WeatherResult> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;
        if now.duration_since(entry.fetched_at) <= self.ttl {
            Some(entry.result.clone())
        } else {
            None
        }
    }

    pub fn store(&self, key: CacheKey, result: WeatherResult) {
        self.store_at(key, result, Instant::now());
    }

    pub fn store_at(&self, key: CacheKey, result: WeatherResult, fetched_at: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, CacheEntry { result, fetched_at });
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
