use std::collections::VecDeque;

/// Small strict-LRU cache.
///
/// Entries live in a `VecDeque` ordered from least to most recently used, so
/// lookups are linear. It is meant for a handful of decoded chunks, where the
/// scan is cheaper than hashing. Both [`insert`](Self::insert) and
/// [`touch`](Self::touch) count as a use.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    entries: VecDeque<(K, V)>,
}

impl<K: PartialEq, V> LruCache<K, V> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mark `key` as most recently used. Returns `false` if it is not cached.
    pub fn touch(&mut self, key: &K) -> bool {
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                if let Some(entry) = self.entries.remove(idx) {
                    self.entries.push_back(entry);
                }
                true
            }
            None => false,
        }
    }

    /// Read without affecting recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert as most recently used, returning the evicted entry if the
    /// cache overflowed.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(idx) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(idx);
        }
        self.entries.push_back((key, value));
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(cache: &LruCache<u32, &str>) -> Vec<u32> {
        cache.keys().copied().collect()
    }

    #[test]
    fn evicts_least_recently_inserted() {
        let mut cache = LruCache::new(3);
        assert!(cache.insert(1, "a").is_none());
        assert!(cache.insert(2, "b").is_none());
        assert!(cache.insert(3, "c").is_none());
        assert_eq!(cache.insert(4, "d"), Some((1, "a")));
        assert_eq!(keys(&cache), vec![2, 3, 4]);
    }

    #[test]
    fn touch_refreshes_recency() {
        let mut cache = LruCache::new(3);
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");
        assert!(cache.touch(&1));
        assert_eq!(cache.insert(4, "d"), Some((2, "b")));
        assert_eq!(keys(&cache), vec![3, 1, 4]);
    }

    #[test]
    fn touch_missing_key() {
        let mut cache: LruCache<u32, &str> = LruCache::new(2);
        assert!(!cache.touch(&9));
    }

    #[test]
    fn reinsert_replaces_and_refreshes() {
        let mut cache = LruCache::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        assert!(cache.insert(1, "z").is_none());
        assert_eq!(cache.peek(&1), Some(&"z"));
        assert_eq!(keys(&cache), vec![2, 1]);
    }

    #[test]
    fn peek_does_not_refresh() {
        let mut cache = LruCache::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        assert_eq!(cache.peek(&1), Some(&"a"));
        assert_eq!(cache.insert(3, "c"), Some((1, "a")));
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut cache = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(1, "a");
        assert_eq!(cache.insert(2, "b"), Some((1, "a")));
        assert_eq!(cache.len(), 1);
    }
}
