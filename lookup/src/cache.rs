// First page of a profile lookup, kept per session so that re-opening the same
// profile doesn't cost another pair of API calls.
use crate::config::CacheConfig;
use crate::metrics_defs::{CACHE_HIT, CACHE_MISS};
use moka::sync::Cache;
use serde_json::Value;
use shared::counter;
use std::sync::Arc;
use std::time::Duration;

pub struct ProfileCache {
    cache: Cache<(String, String), Arc<Value>>,
}

impl ProfileCache {
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();

        ProfileCache { cache }
    }

    pub fn get(&self, session: &str, username: &str) -> Option<Arc<Value>> {
        let entry = self.cache.get(&key(session, username));
        let metric_def = if entry.is_some() {
            CACHE_HIT
        } else {
            CACHE_MISS
        };
        counter!(metric_def).increment(1);
        entry
    }

    pub fn insert(&self, session: &str, username: &str, page: Arc<Value>) {
        self.cache.insert(key(session, username), page);
    }
}

// Usernames are case-insensitive
fn key(session: &str, username: &str) -> (String, String) {
    (session.to_string(), username.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_and_miss() {
        let cache = ProfileCache::new(&CacheConfig::default());
        assert!(cache.get("s1", "someone").is_none());

        cache.insert("s1", "SomeOne", Arc::new(json!({"page": 1})));
        assert_eq!(*cache.get("s1", "someone").unwrap(), json!({"page": 1}));
        assert_eq!(*cache.get("s1", "SOMEONE").unwrap(), json!({"page": 1}));

        // Scoped to the session
        assert!(cache.get("s2", "someone").is_none());
    }
}
