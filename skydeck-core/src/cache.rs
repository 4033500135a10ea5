//! In-memory response cache with time-based expiry.
//!
//! Entries are keyed by endpoint name plus a canonical encoding of the request
//! parameters, so `{lat, lon}` and `{lon, lat}` land on the same entry. Expiry
//! is only checked on read: a stale entry stays in the map until the next
//! `put` for the same key replaces it, but `get` never hands it out.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Default time-to-live, 10 minutes.
pub const DEFAULT_TTL_SECS: i64 = 600;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    written_at: DateTime<Utc>,
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatus {
    pub entry_count: usize,
    /// Key bytes plus serialized payload bytes. Expired entries are included.
    pub approximate_bytes: usize,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Build from a std duration, saturating absurdly large values.
    pub fn with_ttl(ttl: std::time::Duration) -> Self {
        Self::new(Duration::from_std(ttl).unwrap_or(Duration::MAX))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Canonical key for `endpoint` and `params`; parameter order is irrelevant.
    pub fn key<I, K, V>(endpoint: &str, params: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let sorted: BTreeMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        // A map of strings always serializes.
        let encoded = serde_json::to_string(&sorted).unwrap_or_default();
        format!("{endpoint}:{encoded}")
    }

    pub fn get<I, K, V>(&self, endpoint: &str, params: I) -> Option<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.get_at(endpoint, params, Utc::now())
    }

    pub fn get_at<I, K, V>(&self, endpoint: &str, params: I, now: DateTime<Utc>) -> Option<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let key = Self::key(endpoint, params);
        let entries = self.entries.lock();
        let entry = entries.get(&key)?;

        if now - entry.written_at > self.ttl {
            tracing::debug!(%key, "cache entry expired");
            return None;
        }

        Some(entry.payload.clone())
    }

    pub fn put<I, K, V>(&self, endpoint: &str, params: I, payload: Value)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.put_at(endpoint, params, payload, Utc::now());
    }

    pub fn put_at<I, K, V>(&self, endpoint: &str, params: I, payload: Value, now: DateTime<Utc>)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let key = Self::key(endpoint, params);
        self.entries.lock().insert(
            key,
            CacheEntry {
                payload,
                written_at: now,
            },
        );
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn status(&self) -> CacheStatus {
        let entries = self.entries.lock();
        let approximate_bytes = entries
            .iter()
            .map(|(key, entry)| key.len() + entry.payload.to_string().len())
            .sum();

        CacheStatus {
            entry_count: entries.len(),
            approximate_bytes,
        }
    }
}
