//! Small bounded caches used by [`super::DialogueBrain`].
//!
//! No `lru` crate is pulled in for this — the two caches here are small,
//! single-purpose, and hand-rolled the same way the rest of this crate
//! prefers a purpose-built container over a general-purpose dependency
//! (see the audio ring buffer).

use std::collections::HashMap;
use std::collections::VecDeque;
use std::hash::Hash;

/// Fixed-capacity least-recently-used cache backed by an insertion-ordered
/// map. `get` promotes the accessed key to most-recently-used; `put` evicts
/// the least-recently-used entry once at capacity.
pub struct LruCache<K, V> {
    capacity: usize,
    // Order of use, oldest first. Kept separate from `map` so `get` can
    // reposition a key in O(n) over a small n (capacity is 200) rather than
    // needing an intrusive linked structure.
    order: VecDeque<K>,
    map: HashMap<K, V>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LRU cache capacity must be nonzero");
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            map: HashMap::with_capacity(capacity),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        if !self.map.contains_key(key) {
            return None;
        }
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos).unwrap();
            self.order.push_back(k);
        }
        self.map.get(key).cloned()
    }

    pub fn put(&mut self, key: K, value: V) {
        if self.map.contains_key(&key) {
            if let Some(pos) = self.order.iter().position(|k| k == &key) {
                self.order.remove(pos);
            }
        } else if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.map.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A fixed-length ring of the most recent suggestions handed out, used to
/// discourage the suggestion engine from repeating itself even across
/// distinct conversation states.
pub struct LastSuggestionRing {
    capacity: usize,
    items: VecDeque<String>,
}

impl LastSuggestionRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, suggestion: &str) {
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(suggestion.to_string());
    }

    pub fn contains(&self, suggestion: &str) -> bool {
        self.items.iter().any(|s| s == suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lru_evicts_oldest_unused() {
        let mut cache: LruCache<i32, &'static str> = LruCache::new(2);
        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c");
        assert_eq!(cache.get(&1), None, "1 should have been evicted");
        assert_eq!(cache.get(&2), Some("b"));
        assert_eq!(cache.get(&3), Some("c"));
    }

    #[test]
    fn lru_get_promotes_recency() {
        let mut cache: LruCache<i32, &'static str> = LruCache::new(2);
        cache.put(1, "a");
        cache.put(2, "b");
        cache.get(&1); // 1 is now MRU, 2 is LRU
        cache.put(3, "c");
        assert_eq!(cache.get(&2), None, "2 should be evicted, not 1");
        assert_eq!(cache.get(&1), Some("a"));
    }

    #[test]
    fn ring_caps_at_capacity_and_detects_membership() {
        let mut ring = LastSuggestionRing::new(3);
        ring.push("a");
        ring.push("b");
        ring.push("c");
        assert!(ring.contains("a"));
        ring.push("d");
        assert!(!ring.contains("a"), "a should have rolled off");
        assert!(ring.contains("d"));
    }
}
