//! The pinned-guard blockstore decorator.

use std::sync::Arc;

use bytes::Bytes;
use cid::Cid;
use futures::{stream, StreamExt};
use tracing::warn;

use cask_store::{BlockStream, Blockstore, CidStream, Query, StoreError, StoreResult};
use cask_types::CancelToken;

use crate::error::PinError;
use crate::manager::PinManager;
use crate::record::PinKind;

/// A blockstore that refuses to delete pinned content.
///
/// Wraps the *raw* blockstore — construction enforces the decorator order;
/// there is no way to reach the unguarded `delete` through this type. The
/// pin check and the delete are not atomic: a pin added between them can be
/// lost. GC's exclusive lock is the real safety net; this guard is
/// best-effort protection for ordinary deletes.
#[derive(Clone)]
pub struct PinnedBlockstore {
    inner: Blockstore,
    pins: Arc<PinManager>,
}

impl PinnedBlockstore {
    /// Guard `inner` using `pins` for status checks.
    pub fn new(inner: Blockstore, pins: Arc<PinManager>) -> Self {
        Self { inner, pins }
    }

    async fn ensure_unpinned(&self, cid: &Cid) -> StoreResult<()> {
        let status = self
            .pins
            .is_pinned_with_type(cid, &[PinKind::All], &CancelToken::new())
            .await
            .map_err(|e| match e {
                PinError::Store(inner) => inner,
                other => StoreError::Backend(other.to_string()),
            })?;
        if status.pinned {
            warn!(%cid, reason = ?status.reason, "refusing to delete pinned block");
            return Err(StoreError::Pinned(*cid));
        }
        Ok(())
    }

    /// Fetch a block.
    pub async fn get(&self, cid: &Cid) -> StoreResult<Bytes> {
        self.inner.get(cid).await
    }

    /// Store a block.
    pub async fn put(&self, cid: &Cid, data: Bytes) -> StoreResult<()> {
        self.inner.put(cid, data).await
    }

    /// Returns `true` if the block is present.
    pub async fn has(&self, cid: &Cid) -> StoreResult<bool> {
        self.inner.has(cid).await
    }

    /// Delete a block, failing with [`StoreError::Pinned`] before touching
    /// the backend if the block is pinned in any way.
    pub async fn delete(&self, cid: &Cid) -> StoreResult<()> {
        self.ensure_unpinned(cid).await?;
        self.inner.delete(cid).await
    }

    /// Delete many blocks, checking each one. Pinned CIDs surface as
    /// per-item [`StoreError::Pinned`] results; later items still proceed.
    pub fn delete_many(&self, cids: Vec<Cid>) -> CidStream {
        let guard = self.clone();
        Box::pin(stream::iter(cids).then(move |cid| {
            let guard = guard.clone();
            async move {
                guard.ensure_unpinned(&cid).await?;
                guard.inner.delete(&cid).await?;
                Ok(cid)
            }
        }))
    }

    /// Stream the blocks for `cids`, one result per input.
    pub fn get_many(&self, cids: Vec<Cid>) -> BlockStream {
        self.inner.get_many(cids)
    }

    /// Store many blocks through one backend batch.
    pub async fn put_many(&self, blocks: Vec<(Cid, Bytes)>) -> StoreResult<CidStream> {
        self.inner.put_many(blocks).await
    }

    /// Stream stored blocks.
    pub fn query(&self, query: Query) -> BlockStream {
        self.inner.query(query)
    }

    /// Stream stored block CIDs.
    pub fn query_keys(&self, query: Query) -> CidStream {
        self.inner.query_keys(query)
    }

    /// The guarded blockstore.
    pub fn inner(&self) -> &Blockstore {
        &self.inner
    }
}
