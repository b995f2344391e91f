//! The byte-oriented key/value contract implemented by storage adapters.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::StoreResult;

/// A boxed stream of backend keys.
pub type KeyStream = Pin<Box<dyn Stream<Item = StoreResult<String>> + Send>>;

/// A boxed stream of `(key, value)` entries.
pub type EntryStream = Pin<Box<dyn Stream<Item = StoreResult<(String, Bytes)>> + Send>>;

/// Selection criteria for [`Backend::query`] / [`Backend::query_keys`].
///
/// Backends return entries in their natural key order. Filtering beyond
/// prefix/limit is done by the caller on the stream.
#[derive(Clone, Debug, Default)]
pub struct Query {
    /// Only yield entries whose key starts with this prefix.
    pub prefix: Option<String>,
    /// Stop after this many entries.
    pub limit: Option<usize>,
}

impl Query {
    /// A query matching every entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// A query matching entries under `prefix`.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            limit: None,
        }
    }

    /// Cap the number of entries yielded.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Byte-oriented key/value store, one per named repo role
/// (root / blocks / datastore / keys / pins).
///
/// All implementations must be safe to share across tasks and threads;
/// multiple repo handles may point at the same underlying storage.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Open the backend. Idempotent.
    async fn open(&self) -> StoreResult<()>;

    /// Close the backend. Operations on a closed backend fail with
    /// [`StoreError::Closed`](crate::StoreError::Closed).
    async fn close(&self) -> StoreResult<()>;

    /// Fetch the value under `key`, or a typed not-found error.
    async fn get(&self, key: &str) -> StoreResult<Bytes>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()>;

    /// Returns `true` if `key` has a value.
    async fn has(&self, key: &str) -> StoreResult<bool>;

    /// Remove the value under `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Lazily stream `(key, value)` entries matching `query`.
    fn query(&self, query: Query) -> EntryStream;

    /// Lazily stream keys matching `query`.
    fn query_keys(&self, query: Query) -> KeyStream;

    /// Start a batch of writes/deletes applied atomically on commit.
    fn batch(&self) -> Box<dyn BackendBatch>;
}

impl std::fmt::Debug for dyn Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Backend")
    }
}

/// A pending batch of mutations against one backend.
#[async_trait]
pub trait BackendBatch: Send {
    /// Queue a put.
    fn put(&mut self, key: String, value: Bytes);

    /// Queue a delete.
    fn delete(&mut self, key: String);

    /// Apply every queued mutation.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
