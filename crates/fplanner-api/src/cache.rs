// Short-lived response cache keyed by request URL.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    stored_at: Instant,
}

/// Raw response bodies with their fetch time. Freshness is decided by the
/// caller's TTL at read time, so one cache serves both static and live data.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// The cached body for `key` if it is younger than `ttl`.
    pub fn get(&self, key: &str, ttl: Duration) -> Option<String> {
        let entries = self.entries();
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() < ttl {
            Some(entry.body.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: &str, body: String) {
        self.entries().insert(
            key.to_string(),
            CacheEntry {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
