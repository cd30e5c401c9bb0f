use std::collections::HashMap;
use std::hash::Hash;

#[derive(Clone, Debug)]
/// A least-recently-used map with a fixed capacity.
///
/// Used for the arrow-anchor memo of the layout planner and for the optional scene cache.
/// Each entry records the tick of its last access; inserting into a full map evicts the
/// entry with the oldest tick. Capacities are small (hundreds), so eviction scans the map.
/// A capacity of zero disables storage entirely.
///
/// # Examples
///
/// ```rust
/// use maire::memo::BoundedLru;
/// let mut lru = BoundedLru::new(2);
/// lru.insert("a", 1);
/// lru.insert("b", 2);
/// assert_eq!(lru.get(&"a"), Some(&1));
/// lru.insert("c", 3); // evicts "b", the least recently used
/// assert!(lru.get(&"b").is_none());
/// assert_eq!(lru.len(), 2);
/// ```
pub struct BoundedLru<K, V> {
    entries: HashMap<K, (V, u64)>,
    capacity: usize,
    tick: u64,
}

impl<K: Eq + Hash + Clone, V> BoundedLru<K, V> {
    pub fn new(capacity: usize) -> BoundedLru<K, V> {
        BoundedLru {
            entries: HashMap::with_capacity(capacity),
            capacity,
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Looks up `key` and marks it as most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let tick = self.next_tick();
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.1 = tick;
                Some(&entry.0)
            }
            None => None,
        }
    }

    /// Inserts `value` under `key`, evicting the least recently used entry if the map is full.
    /// Returns the evicted key, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if self.capacity == 0 {
            return None;
        }
        let tick = self.next_tick();
        let mut evicted = None;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, (_, t))| *t)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }
        self.entries.insert(key, (value, tick));
        evicted
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_eviction_order() {
        let mut lru = BoundedLru::new(3);
        lru.insert(1, "one");
        lru.insert(2, "two");
        lru.insert(3, "three");
        // touch 1 so that 2 becomes the oldest
        assert_eq!(lru.get(&1), Some(&"one"));
        assert_eq!(lru.insert(4, "four"), Some(2));
        assert!(lru.contains_key(&1));
        assert!(!lru.contains_key(&2));
        assert_eq!(lru.len(), 3);
    }

    #[test]
    fn test_lru_overwrite_does_not_evict() {
        let mut lru = BoundedLru::new(2);
        lru.insert("a", 1);
        lru.insert("b", 2);
        assert_eq!(lru.insert("a", 10), None);
        assert_eq!(lru.get(&"a"), Some(&10));
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_lru_zero_capacity() {
        let mut lru: BoundedLru<&str, i32> = BoundedLru::new(0);
        lru.insert("a", 1);
        assert!(lru.is_empty());
        assert!(lru.get(&"a").is_none());
    }
}
