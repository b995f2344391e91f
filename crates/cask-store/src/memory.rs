//! In-memory, BTreeMap-based backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use crate::backend::{Backend, BackendBatch, EntryStream, KeyStream, Query};
use crate::error::{StoreError, StoreResult};

/// In-memory backend for tests and embedding.
///
/// Entries live in a `BTreeMap` behind an `RwLock`, so prefix queries come
/// back in key order. Query streams snapshot the matching entries at call
/// time; later writes do not appear in an already-created stream.
pub struct MemoryBackend {
    entries: Arc<RwLock<BTreeMap<String, Bytes>>>,
    open: AtomicBool,
}

impl MemoryBackend {
    /// A fresh, already-open backend.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            open: AtomicBool::new(true),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the backend holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.open.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    fn snapshot(&self, query: &Query) -> Vec<(String, Bytes)> {
        let map = self.entries.read().expect("lock poisoned");
        let matching = map
            .iter()
            .filter(|(k, _)| match &query.prefix {
                Some(p) => k.starts_with(p.as_str()),
                None => true,
            })
            .map(|(k, v)| (k.clone(), v.clone()));
        match query.limit {
            Some(n) => matching.take(n).collect(),
            None => matching.collect(),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn open(&self) -> StoreResult<()> {
        self.open.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        self.open.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.ensure_open()?;
        let map = self.entries.read().expect("lock poisoned");
        map.get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.ensure_open()?;
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key.to_string(), value);
        Ok(())
    }

    async fn has(&self, key: &str) -> StoreResult<bool> {
        self.ensure_open()?;
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.ensure_open()?;
        let mut map = self.entries.write().expect("lock poisoned");
        map.remove(key);
        Ok(())
    }

    fn query(&self, query: Query) -> EntryStream {
        if let Err(e) = self.ensure_open() {
            return Box::pin(stream::iter([Err(e)]));
        }
        Box::pin(stream::iter(self.snapshot(&query).into_iter().map(Ok)))
    }

    fn query_keys(&self, query: Query) -> KeyStream {
        if let Err(e) = self.ensure_open() {
            return Box::pin(stream::iter([Err(e)]));
        }
        Box::pin(stream::iter(
            self.snapshot(&query).into_iter().map(|(k, _)| Ok(k)),
        ))
    }

    fn batch(&self) -> Box<dyn BackendBatch> {
        Box::new(MemoryBatch {
            entries: Arc::clone(&self.entries),
            ops: Vec::new(),
        })
    }
}

enum BatchOp {
    Put(String, Bytes),
    Delete(String),
}

struct MemoryBatch {
    entries: Arc<RwLock<BTreeMap<String, Bytes>>>,
    ops: Vec<BatchOp>,
}

#[async_trait]
impl BackendBatch for MemoryBatch {
    fn put(&mut self, key: String, value: Bytes) {
        self.ops.push(BatchOp::Put(key, value));
    }

    fn delete(&mut self, key: String) {
        self.ops.push(BatchOp::Delete(key));
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        for op in self.ops {
            match op {
                BatchOp::Put(k, v) => {
                    map.insert(k, v);
                }
                BatchOp::Delete(k) => {
                    map.remove(&k);
                }
            }
        }
        Ok(())
    }
}
