//! Fixed-bucket chained hash table with caller-supplied hash/compare
//! (spec.md §4.B). No resizing; collision resolution is chaining, exactly
//! as `examples/original_source/.../hashTable.h` does it — the port swaps
//! the hand-rolled `RsslQueue` buckets for `Vec<Vec<V>>`.

/// A chained hash table keyed by a caller-provided `Key` type (which must
/// itself implement `Hash + Eq`, matching the spec's requirement that
/// "compare functions must match the hash domain exactly" — value
/// equality, not reference equality).
pub struct HashTable<K, V> {
    buckets: Vec<Vec<(K, V)>>,
}

/// Default bucket count — a prime, as the reference recommends
/// (spec.md §4.B "Fixed bucket count (chosen prime, e.g., 10007)").
pub const DEFAULT_BUCKET_COUNT: usize = 10_007;

impl<K, V> HashTable<K, V>
where
    K: std::hash::Hash + Eq,
{
    pub fn new(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        let mut buckets = Vec::with_capacity(bucket_count);
        buckets.resize_with(bucket_count, Vec::new);
        HashTable { buckets }
    }

    fn bucket_index(&self, key: &K) -> usize {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.buckets.len()
    }

    pub fn insert(&mut self, key: K, value: V) {
        let idx = self.bucket_index(&key);
        self.buckets[idx].push((key, value));
    }

    pub fn find(&self, key: &K) -> Option<&V> {
        let idx = self.bucket_index(key);
        self.buckets[idx]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.bucket_index(key);
        self.buckets[idx]
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Removes and returns the first matching entry, if any.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.bucket_index(key);
        let bucket = &mut self.buckets[idx];
        let pos = bucket.iter().position(|(k, _)| k == key)?;
        Some(bucket.swap_remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_find_remove_round_trip() {
        let mut t: HashTable<i32, &str> = HashTable::new(4);
        t.insert(1, "a");
        t.insert(2, "b");
        t.insert(10_005, "collides-with-1-at-bucket-4"); // exercise chaining

        assert_eq!(t.find(&1), Some(&"a"));
        assert_eq!(t.find(&2), Some(&"b"));
        assert_eq!(t.len(), 3);

        assert_eq!(t.remove(&2), Some("b"));
        assert_eq!(t.find(&2), None);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn find_missing_key_is_none() {
        let t: HashTable<String, i32> = HashTable::new(16);
        assert_eq!(t.find(&"nope".to_string()), None);
    }

    #[test]
    fn single_bucket_degrades_to_linear_scan_but_stays_correct() {
        let mut t: HashTable<i32, i32> = HashTable::new(1);
        for i in 0..50 {
            t.insert(i, i * 2);
        }
        for i in 0..50 {
            assert_eq!(t.find(&i), Some(&(i * 2)));
        }
    }
}
