use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct CacheItem {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Option<Instant>,
}

/// In-memory key/value cache with per-entry expiry.
///
/// Values are stored type-erased; `get` returns `None` when the stored value
/// is of a different type than requested. Eviction is lazy (on access), and
/// the cache is advisory: everything in it can be rebuilt from the engine.
pub struct TtlCache {
    items: Mutex<HashMap<String, CacheItem>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        let mut items = self.items.lock().unwrap();
        let expired = items
            .get(key)
            .is_some_and(|item| item.expires_at.is_some_and(|at| Instant::now() > at));
        if expired {
            items.remove(key);
            return None;
        }
        items
            .get(key)
            .and_then(|item| item.value.downcast_ref::<T>().cloned())
    }

    /// `ttl` of zero means the entry never expires.
    pub fn set<T: Send + Sync + 'static>(&self, key: &str, value: T, ttl: Duration) {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + ttl)
        };
        let mut items = self.items.lock().unwrap();
        items.insert(
            key.to_string(),
            CacheItem {
                value: Arc::new(value),
                expires_at,
            },
        );
    }

    pub fn clear(&self) {
        self.items.lock().unwrap().clear();
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}
