//! Cache-aside storage for service read results.
//!
//! Entries are JSON strings under namespaced keys (`products:id:<id>`,
//! `users:all`, ...) held in a bounded `moka` cache with a time-to-live.
//! Invalidation is explicit and lives in the services.

use std::time::Duration;

use moka::sync::Cache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

pub const DEFAULT_CAPACITY: u64 = 10_000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub struct CacheAside {
    entries: Option<Cache<String, String>>,
}

impl CacheAside {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// At most `capacity` entries, each living at most `ttl`.
    pub fn with_limits(capacity: u64, ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self {
            entries: Some(entries),
        }
    }

    /// A cache that never stores anything. Every read goes to the loader.
    pub fn disabled() -> Self {
        Self { entries: None }
    }

    pub fn from_config(enabled: bool, capacity: u64, ttl: Duration) -> Self {
        if enabled {
            Self::with_limits(capacity, ttl)
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Undecodable entries are dropped and reported as a miss.
    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let raw = self.entries.as_ref()?.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "dropping undecodable cache entry");
                self.invalidate(key);
                None
            }
        }
    }

    pub fn put<V: Serialize>(&self, key: impl Into<String>, value: &V) {
        let Some(entries) = &self.entries else {
            return;
        };
        let key = key.into();
        match serde_json::to_string(value) {
            Ok(raw) => entries.insert(key, raw),
            Err(e) => warn!(key, error = %e, "cache entry not serializable; skipping"),
        }
    }

    /// Return the cached value for `key`, or run `loader` and cache its
    /// result. Loader errors are returned and nothing is cached.
    pub fn get_or_try_insert<V, E, F>(&self, key: &str, loader: F) -> Result<V, E>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let value = loader()?;
        self.put(key, &value);
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) {
        if let Some(entries) = &self.entries {
            entries.invalidate(key);
        }
    }

    pub fn invalidate_matching(&self, prefix: &str) {
        let evicted = self.remove_where(|key| key.starts_with(prefix));
        debug!(prefix, evicted, "cache namespace evicted");
    }

    pub fn invalidate_all(&self) {
        self.remove_where(|_| true);
    }

    /// Entry count after pending evictions have been applied.
    pub fn len(&self) -> u64 {
        match &self.entries {
            Some(entries) => {
                entries.run_pending_tasks();
                entries.entry_count()
            }
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_where(&self, matches: impl Fn(&str) -> bool) -> usize {
        let Some(entries) = &self.entries else {
            return 0;
        };
        let keys: Vec<_> = entries
            .iter()
            .filter(|(key, _)| matches(key.as_str()))
            .map(|(key, _)| key)
            .collect();
        for key in &keys {
            entries.invalidate(key.as_str());
        }
        keys.len()
    }
}

impl Default for CacheAside {
    fn default() -> Self {
        Self::new()
    }
}
