//! Fixed-capacity map that evicts the entry updated longest ago.

use chrono::Utc;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    updated_at: i64,
    seq: u64,
}

#[derive(Debug, Clone)]
pub struct BoundedCache<V> {
    capacity: usize,
    entries: HashMap<String, Slot<V>>,
    seq: u64,
}

impl<V> BoundedCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), entries: HashMap::new(), seq: 0 }
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

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key).map(|s| &s.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or refresh `key`. Returns the evicted key, if any.
    pub fn insert(&mut self, key: String, value: V) -> Option<String> {
        let mut evicted = None;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            evicted = self.oldest_key();
            if let Some(old) = &evicted {
                self.entries.remove(old);
            }
        }
        self.seq += 1;
        let slot = Slot { value, updated_at: Utc::now().timestamp_millis(), seq: self.seq };
        self.entries.insert(key, slot);
        evicted
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|s| s.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn oldest_key(&self) -> Option<String> {
        self.entries.iter().min_by_key(|(_, s)| (s.updated_at, s.seq)).map(|(k, _)| k.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_updated() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        // refreshing a makes b the oldest
        cache.insert("a".to_string(), 3);
        assert_eq!(cache.insert("c".to_string(), 4), Some("b".to_string()));
        assert_eq!(cache.get("a"), Some(&3));
        assert!(!cache.contains("b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn refresh_does_not_evict() {
        let mut cache = BoundedCache::new(1);
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.insert("a".to_string(), 2), None);
        assert_eq!(cache.get("a"), Some(&2));
    }
}
