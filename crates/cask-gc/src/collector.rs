//! The mark-and-sweep collector.

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;

use cid::Cid;
use futures::{Stream, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use cask_pin::PinManager;
use cask_store::{Backend, Blockstore, Query, StoreError};
use cask_types::{cid_to_key, CancelToken};

use crate::error::GcResult;
use crate::lock::GcLock;

/// Root-backend key holding the MFS root CID, when one exists.
pub const MFS_ROOT_KEY: &str = "/local/filesroot";

/// Default cap on in-flight sweep deletions. Backend deletes may be network
/// calls; unbounded concurrency would exhaust connections.
pub const DEFAULT_SWEEP_CONCURRENCY: usize = 256;

/// One sweep outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GcEvent {
    /// The block was unreferenced and has been deleted.
    Removed(Cid),
    /// A deletion attempt (or the key stream itself) failed; the sweep
    /// continues past it. `cid` is `None` only when the failure happened
    /// before a CID could be decoded from the key stream.
    Failed { cid: Option<Cid>, reason: String },
}

/// A boxed stream of sweep outcomes.
pub type GcStream = Pin<Box<dyn Stream<Item = GcEvent> + Send>>;

/// Mark-and-sweep reclamation over a blockstore.
pub struct GarbageCollector {
    blocks: Blockstore,
    pins: Arc<PinManager>,
    root: Arc<dyn Backend>,
    lock: GcLock,
    concurrency: usize,
}

impl GarbageCollector {
    /// Compose a collector from the stores it coordinates.
    pub fn new(
        blocks: Blockstore,
        pins: Arc<PinManager>,
        root: Arc<dyn Backend>,
        lock: GcLock,
    ) -> Self {
        Self {
            blocks,
            pins,
            root,
            lock,
            concurrency: DEFAULT_SWEEP_CONCURRENCY,
        }
    }

    /// Override the sweep-deletion concurrency cap.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run one collection.
    ///
    /// Acquires the exclusive GC lock (waiting out writers), builds the
    /// retained set, then returns the sweep stream. The lock is held until
    /// the stream is dropped; mark-phase errors release it immediately.
    /// Individual deletion failures surface as [`GcEvent::Failed`] items
    /// and never abort the sweep.
    pub async fn collect(&self, cancel: &CancelToken) -> GcResult<GcStream> {
        cancel.checkpoint()?;
        let guard = self.lock.exclusive().await;
        info!("gc: exclusive lock acquired");

        let marked = Arc::new(self.build_mark_set(cancel).await?);
        info!(marked = marked.len(), "gc: mark phase complete");

        let guard = Arc::new(guard);
        let blocks = self.blocks.clone();
        let take_cancel = cancel.clone();

        let sweep = self
            .blocks
            .query_keys(Query::all())
            // Cancellation is cooperative: stop issuing deletes, let
            // in-flight ones finish.
            .take_while(move |_| {
                let go = !take_cancel.is_cancelled();
                async move { go }
            })
            .map(move |res| {
                let blocks = blocks.clone();
                let marked = Arc::clone(&marked);
                let guard = Arc::clone(&guard);
                async move {
                    // Keeps the exclusive lock alive for the stream's life.
                    let _held = guard;
                    match res {
                        Err(e) => Some(GcEvent::Failed {
                            cid: None,
                            reason: e.to_string(),
                        }),
                        Ok(cid) => {
                            if marked.contains(&cid_to_key(&cid)) {
                                return None;
                            }
                            match blocks.delete(&cid).await {
                                Ok(()) => {
                                    debug!(%cid, "gc: reclaimed block");
                                    Some(GcEvent::Removed(cid))
                                }
                                Err(e) => {
                                    warn!(%cid, error = %e, "gc: delete failed");
                                    Some(GcEvent::Failed {
                                        cid: Some(cid),
                                        reason: e.to_string(),
                                    })
                                }
                            }
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|event| async move { event });

        Ok(Box::pin(sweep))
    }

    /// The retained set: every pinned key plus the MFS root closure, as
    /// backend key strings (base32 multihash) to bound memory.
    async fn build_mark_set(&self, cancel: &CancelToken) -> GcResult<HashSet<String>> {
        let mut marked = HashSet::new();

        let mut recursive = self.pins.recursive_keys();
        while let Some(cid) = recursive.try_next().await? {
            marked.insert(cid_to_key(&cid));
        }
        cancel.checkpoint()?;

        let mut indirect = self.pins.indirect_keys(cancel);
        while let Some(cid) = indirect.try_next().await? {
            marked.insert(cid_to_key(&cid));
        }
        cancel.checkpoint()?;

        let mut direct = self.pins.direct_keys();
        while let Some(cid) = direct.try_next().await? {
            marked.insert(cid_to_key(&cid));
        }
        cancel.checkpoint()?;

        match self.root.get(MFS_ROOT_KEY).await {
            Ok(bytes) => {
                let root_cid = Cid::try_from(bytes.as_ref())
                    .map_err(|e| crate::error::GcError::MfsRoot(e.to_string()))?;
                debug!(%root_cid, "gc: marking MFS root closure");
                marked.extend(self.pins.reachable_keys(&root_cid, cancel).await?);
            }
            // No MFS root is not an error, just an empty contribution.
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        Ok(marked)
    }
}
