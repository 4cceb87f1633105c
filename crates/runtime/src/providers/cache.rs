//! Short-TTL cache for parsed intents.
//!
//! Keyed by `SHA-256(userText|serialized_context)` so the same utterance in
//! a different situation parses fresh. Entries expire after 30 seconds;
//! expired entries are swept opportunistically on insert.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use world_core::Intent;

use super::GameContext;

/// Default entry lifetime.
pub const CACHE_TTL: Duration = Duration::from_secs(30);

/// Thread-safe intent cache with a fixed TTL.
pub struct ParseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Intent)>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache key for an utterance in a context.
    pub fn key(text: &str, ctx: &GameContext) -> String {
        let serialized = serde_json::to_string(ctx).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(b"|");
        hasher.update(serialized.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<Intent> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, intent)| intent.clone())
    }

    pub fn insert(&self, key: String, intent: Intent) {
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, (at, _)| at.elapsed() < ttl);
            entries.insert(key, (Instant::now(), intent));
        }
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_within_ttl_and_misses_after() {
        let cache = ParseCache::with_ttl(Duration::from_millis(20));
        let ctx = GameContext::default();
        let key = ParseCache::key("look", &ctx);
        cache.insert(key.clone(), Intent::noop());
        assert!(cache.get(&key).is_some());
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn key_depends_on_context() {
        let a = GameContext::default();
        let mut b = GameContext::default();
        b.layer = 2;
        assert_ne!(ParseCache::key("look", &a), ParseCache::key("look", &b));
    }
}
