// ABOUTME: Short-lived response cache keyed by a normalized-input fingerprint
// ABOUTME: Identical recent requests are served without re-running the pipeline

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(900);

/// Normalizes a request into a cache key: lowercased, whitespace collapsed,
/// tagged with mode and style so distinct outputs never collide.
pub fn fingerprint(description: &str, mode: &str, style: &str) -> String {
    let normalized = description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    format!("{}|{}|{}", mode, style, normalized)
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// TTL cache for rendered documents.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Response cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: String, value: String) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().expect("cache lock poisoned");
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: entries.len(),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fingerprint_normalizes_whitespace_and_case() {
        let a = fingerprint("Build  a Task\napp", "prd", "structured");
        let b = fingerprint("build a task app", "prd", "structured");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_separates_modes_and_styles() {
        let key = fingerprint("build an app", "prompt", "minimal");
        assert_ne!(key, fingerprint("build an app", "prd", "minimal"));
        assert_ne!(key, fingerprint("build an app", "prompt", "structured"));
    }

    #[test]
    fn cache_round_trip_and_stats() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("k"), None);

        cache.put("k".to_string(), "document".to_string());
        assert_eq!(cache.get("k"), Some("document".to_string()));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = ResponseCache::new(Duration::from_millis(20));
        cache.put("k".to_string(), "document".to_string());

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("k"), None);
    }
}
