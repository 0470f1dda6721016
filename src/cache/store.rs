use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use axum::http::Method;
use serde_json::Value;
use tracing::debug;

use super::lock;
use crate::config::CacheConfig;

struct CacheEntry {
    value: Value,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Value, ttl_secs: u64) -> Self {
        Self {
            value,
            expires_at: Instant::now().checked_add(Duration::from_secs(ttl_secs)),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Process-local response cache with per-entry TTL.
///
/// Built once at startup from [`CacheConfig`] and shared through the
/// application state. When caching is disabled no request is cache-eligible
/// and `refresh` is a no-op.
pub struct CacheStore {
    is_active: bool,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Bumped by every `refresh`
    generation: AtomicU64,
}

impl CacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            is_active: config.is_active,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Cache-eligible: caching enabled and a GET request.
    pub fn is_cachable(&self, method: &Method) -> bool {
        self.is_active && *method == Method::GET
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        {
            let entries = lock::read(&self.entries, "get");
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Expired; drop it unless a concurrent put replaced it meanwhile.
        let mut entries = lock::write(&self.entries, "get.evict");
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        None
    }

    /// Store `value` under `key` for `ttl_secs`, replacing any existing entry.
    pub fn put(&self, key: impl Into<String>, value: Value, ttl_secs: u64) {
        lock::write(&self.entries, "put").insert(key.into(), CacheEntry::new(value, ttl_secs));
    }

    /// Like [`put`](Self::put), but only if no `refresh` ran since
    /// `generation` was read. Returns whether the value was stored.
    pub fn put_since(
        &self,
        key: impl Into<String>,
        value: Value,
        ttl_secs: u64,
        generation: u64,
    ) -> bool {
        let mut entries = lock::write(&self.entries, "put_since");
        if self.generation() != generation {
            return false;
        }
        entries.insert(key.into(), CacheEntry::new(value, ttl_secs));
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn del(&self, key: &str) -> bool {
        lock::write(&self.entries, "del").remove(key).is_some()
    }

    /// Keys of all live entries.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        lock::read(&self.entries, "keys")
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = lock::write(&self.entries, "purge_expired");
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Invalidate every key containing `segment`.
    ///
    /// Returns `false` without touching the store when caching is disabled.
    pub fn refresh(&self, segment: &str) -> bool {
        if !self.is_active {
            return false;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.keys();
        let removed = snapshot
            .iter()
            .filter(|key| key.contains(segment))
            .filter(|key| self.del(key))
            .count();
        debug!(segment, removed, "cache segment refreshed");
        true
    }
}
