//! The CID-keyed content store.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use cid::Cid;
use futures::{stream, Stream, StreamExt};
use tracing::debug;

use cask_types::{cid_to_key, identity_payload, key_to_multihash, RAW_CODEC};

use crate::backend::{Backend, Query};
use crate::error::{StoreError, StoreResult};

/// A boxed stream of CIDs.
pub type CidStream = Pin<Box<dyn Stream<Item = StoreResult<Cid>> + Send>>;

/// A boxed stream of `(cid, data)` blocks.
pub type BlockStream = Pin<Box<dyn Stream<Item = StoreResult<(Cid, Bytes)>> + Send>>;

/// Content store over a [`Backend`], keyed by CID.
///
/// Identity-multihash CIDs are short-circuited at this layer: their content
/// *is* the digest, so `put` persists nothing, `has` is always `true`, `get`
/// answers from the CID itself and `delete` is silently ignored. The backend
/// only ever sees real hashes.
#[derive(Clone)]
pub struct Blockstore {
    backend: Arc<dyn Backend>,
}

impl Blockstore {
    /// Wrap a backend.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Fetch a block. Backend misses surface as
    /// [`StoreError::BlockNotFound`] carrying the requested CID.
    pub async fn get(&self, cid: &Cid) -> StoreResult<Bytes> {
        if let Some(payload) = identity_payload(cid) {
            return Ok(Bytes::copy_from_slice(payload));
        }
        match self.backend.get(&cid_to_key(cid)).await {
            Err(StoreError::NotFound(_)) => Err(StoreError::BlockNotFound(*cid)),
            other => other,
        }
    }

    /// Store a block. Identity CIDs are a no-op.
    pub async fn put(&self, cid: &Cid, data: Bytes) -> StoreResult<()> {
        if identity_payload(cid).is_some() {
            debug!(%cid, "skipping identity block put");
            return Ok(());
        }
        self.backend.put(&cid_to_key(cid), data).await
    }

    /// Returns `true` if the block is present. Identity CIDs always are.
    pub async fn has(&self, cid: &Cid) -> StoreResult<bool> {
        if identity_payload(cid).is_some() {
            return Ok(true);
        }
        self.backend.has(&cid_to_key(cid)).await
    }

    /// Remove a block. Identity CIDs are silently ignored — they were never
    /// in the backend to begin with.
    pub async fn delete(&self, cid: &Cid) -> StoreResult<()> {
        if identity_payload(cid).is_some() {
            return Ok(());
        }
        self.backend.delete(&cid_to_key(cid)).await
    }

    /// Stream the blocks for `cids`, one result per input, in input order.
    pub fn get_many(&self, cids: Vec<Cid>) -> BlockStream {
        let store = self.clone();
        Box::pin(stream::iter(cids).then(move |cid| {
            let store = store.clone();
            async move { store.get(&cid).await.map(|data| (cid, data)) }
        }))
    }

    /// Store many blocks through one backend batch.
    ///
    /// The returned stream confirms every input CID — including identity
    /// CIDs that were never written — so callers can reconcile N writes
    /// against N confirmations.
    pub async fn put_many(&self, blocks: Vec<(Cid, Bytes)>) -> StoreResult<CidStream> {
        let mut batch = self.backend.batch();
        let mut confirmed = Vec::with_capacity(blocks.len());
        for (cid, data) in blocks {
            if identity_payload(&cid).is_none() {
                batch.put(cid_to_key(&cid), data);
            }
            confirmed.push(cid);
        }
        batch.commit().await?;
        debug!(count = confirmed.len(), "put_many committed");
        Ok(Box::pin(stream::iter(confirmed.into_iter().map(Ok))))
    }

    /// `has` for many CIDs, one `(cid, present)` result per input.
    pub fn has_many(&self, cids: Vec<Cid>) -> Pin<Box<dyn Stream<Item = StoreResult<(Cid, bool)>> + Send>> {
        let store = self.clone();
        Box::pin(stream::iter(cids).then(move |cid| {
            let store = store.clone();
            async move { store.has(&cid).await.map(|present| (cid, present)) }
        }))
    }

    /// Delete many blocks through one backend batch, confirming every input.
    pub async fn delete_many(&self, cids: Vec<Cid>) -> StoreResult<CidStream> {
        let mut batch = self.backend.batch();
        for cid in &cids {
            if identity_payload(cid).is_none() {
                batch.delete(cid_to_key(cid));
            }
        }
        batch.commit().await?;
        Ok(Box::pin(stream::iter(cids.into_iter().map(Ok))))
    }

    /// Stream stored blocks. Keys carry only the multihash, so CIDs are
    /// reconstructed as v1/raw.
    pub fn query(&self, query: Query) -> BlockStream {
        Box::pin(self.backend.query(query).map(|res| {
            res.and_then(|(key, value)| {
                let mh = key_to_multihash(&key)?;
                Ok((Cid::new_v1(RAW_CODEC, mh), value))
            })
        }))
    }

    /// Stream stored block CIDs (v1/raw reconstruction, as with `query`).
    pub fn query_keys(&self, query: Query) -> CidStream {
        Box::pin(self.backend.query_keys(query).map(|res| {
            res.and_then(|key| {
                let mh = key_to_multihash(&key)?;
                Ok(Cid::new_v1(RAW_CODEC, mh))
            })
        }))
    }
}
