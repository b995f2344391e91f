//! Bounded LRU "seen" set for DAG traversal.

use std::collections::{BTreeMap, HashMap};

/// Default capacity of a traversal seen-set.
pub const DEFAULT_SEEN_CAPACITY: usize = 2048;

/// A bounded set with least-recently-used eviction.
///
/// Keeps traversal memory bounded on very large DAGs while still collapsing
/// diamond shapes: a re-encountered key refreshes its recency instead of
/// re-descending. Eviction means a long-gone key *may* be visited again —
/// traversal stays correct, just potentially slower.
///
/// Recency is a monotonic stamp per key, with the stamp order held in a
/// `BTreeMap`, so a refresh on a link-dense DAG is a map update rather than
/// a scan.
#[derive(Debug)]
pub struct LruSet {
    stamps: HashMap<String, u64>,
    order: BTreeMap<u64, String>,
    capacity: usize,
    next_stamp: u64,
}

impl LruSet {
    /// A set holding at most `capacity` keys (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            stamps: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            capacity,
            next_stamp: 0,
        }
    }

    /// Returns `true` if `key` is currently in the set.
    pub fn contains(&self, key: &str) -> bool {
        self.stamps.contains_key(key)
    }

    /// Insert `key`. Returns `true` if it was new; `false` refreshes the
    /// key's recency and leaves the set unchanged.
    pub fn insert(&mut self, key: &str) -> bool {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        if let Some(previous) = self.stamps.insert(key.to_string(), stamp) {
            self.order.remove(&previous);
            self.order.insert(stamp, key.to_string());
            return false;
        }

        self.order.insert(stamp, key.to_string());
        if self.stamps.len() > self.capacity {
            if let Some((_, evicted)) = self.order.pop_first() {
                self.stamps.remove(&evicted);
            }
        }
        true
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Returns `true` if no keys are held.
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

impl Default for LruSet {
    fn default() -> Self {
        Self::new(DEFAULT_SEEN_CAPACITY)
    }
}
