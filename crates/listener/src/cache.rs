use std::fmt;
use std::num::NonZeroUsize;

use parking_lot::Mutex;

type Factory<V> = Box<dyn Fn(&str) -> V + Send + Sync>;

/// A bounded, string-keyed cache that computes missing entries with a factory
/// function and evicts the least recently used entry once full.
pub struct LruCache<V> {
    entries: Mutex<lru::LruCache<String, V>>,
    factory: Factory<V>,
}

impl<V: Clone> LruCache<V> {
    pub const DEFAULT_CAPACITY: usize = 32;

    /// Create a cache holding at most `capacity` entries. A capacity of zero is
    /// treated as one.
    pub fn new<F>(capacity: usize, factory: F) -> Self
    where
        F: Fn(&str) -> V + Send + Sync + 'static,
    {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(lru::LruCache::new(capacity)),
            factory: Box::new(factory),
        }
    }

    /// Return the entry for `key`, computing and storing it on a miss.
    pub fn get(&self, key: &str) -> V {
        let mut entries = self.entries.lock();
        if let Some(value) = entries.get(key) {
            return value.clone();
        }
        let value = (self.factory)(key);
        entries.put(key.to_owned(), value.clone());
        value
    }

    /// Return `true` if `key` is cached, without touching its recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains(key)
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("LruCache")
            .field("len", &entries.len())
            .field("capacity", &entries.cap())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting(capacity: usize) -> (LruCache<String>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = LruCache::new(capacity, move |key: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            key.to_uppercase()
        });
        (cache, calls)
    }

    #[test]
    fn computes_once_per_key() {
        let (cache, calls) = counting(4);
        assert_eq!(cache.get("a"), "A");
        assert_eq!(cache.get("a"), "A");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let (cache, calls) = counting(2);
        cache.get("a");
        cache.get("b");
        // Touch "a" so "b" becomes the eviction candidate.
        cache.get("a");
        cache.get("c");

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);

        cache.get("b");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn zero_capacity_holds_one_entry() {
        let (cache, _) = counting(0);
        assert_eq!(cache.capacity(), 1);
        cache.get("a");
        cache.get("b");
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b"));
    }

    #[test]
    fn default_capacity() {
        let (cache, _) = counting(LruCache::<String>::DEFAULT_CAPACITY);
        assert_eq!(cache.capacity(), 32);
        assert!(cache.is_empty());
    }
}
