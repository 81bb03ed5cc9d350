//! In-memory reply cache with per-entry expiry

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    reply: String,
    expires_at: Instant,
}

/// Maps exact message text to the reply it produced.
///
/// An entry is served only while `now < expires_at`; expired entries are
/// dropped when a lookup finds them.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live reply, evicting the entry if it has expired
    pub fn get(&self, message: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        match entries.get(message) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.reply.clone()),
            Some(_) => {
                entries.remove(message);
                tracing::debug!("Cache entry expired for message ({} chars)", message.len());
                None
            }
            None => None,
        }
    }

    /// Store a reply, valid for one TTL from now
    pub fn insert(&self, message: impl Into<String>, reply: impl Into<String>) {
        if self.ttl.is_zero() {
            return;
        }
        let entry = CacheEntry {
            reply: reply.into(),
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().insert(message.into(), entry);
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| now < e.expires_at);
        before - entries.len()
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_hit_before_expiry() {
        let cache = ResponseCache::new(Duration::from_secs(300));
        cache.insert("hello", "hi");

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("hello").as_deref(), Some("hi"));
        assert_eq!(cache.get("hello").as_deref(), Some("hi"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_at_expiry_and_evicted() {
        let cache = ResponseCache::new(Duration::from_secs(300));
        cache.insert("hello", "hi");

        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(cache.get("hello"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_is_exact_text() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("hello", "hi");

        assert_eq!(cache.get("Hello"), None);
        assert_eq!(cache.get("hello "), None);
        assert_eq!(cache.get("hello").as_deref(), Some("hi"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.insert("a", "1");
        tokio::time::advance(Duration::from_secs(5)).await;
        cache.insert("b", "2");
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.insert("hello", "hi");
        assert!(cache.is_empty());
    }
}
