//! Breadth-first DAG traversal over the blockstore.

use std::collections::HashSet;

use cid::Cid;
use futures::future;
use tracing::trace;

use cask_store::Blockstore;
use cask_types::{cid_to_key, CancelToken};

use crate::codec::CodecLoader;
use crate::error::{PinError, PinResult};
use crate::lru::LruSet;

/// Fetch one block and decode its child links.
pub(crate) async fn fetch_links(
    blocks: &Blockstore,
    loader: &CodecLoader,
    cid: &Cid,
) -> PinResult<Vec<Cid>> {
    let data = blocks.get(cid).await?;
    let codec = loader(cid.codec())?;
    codec.links(&data).map_err(|e| PinError::LinkDecode {
        cid: *cid,
        reason: e.to_string(),
    })
}

/// Fetch the complete reachability closure from `root`.
///
/// Walks level by level; within a level every block is fetched concurrently
/// (fan-out is bounded only by the DAG's branching factor). The seen-set is
/// a bounded LRU keyed by CID string, so shared sub-DAGs (diamonds) are
/// descended once. Any missing block or codec failure aborts the whole
/// traversal. Returns the number of blocks fetched.
pub(crate) async fn fetch_complete_dag(
    blocks: &Blockstore,
    loader: &CodecLoader,
    root: &Cid,
    seen_capacity: usize,
    cancel: &CancelToken,
) -> PinResult<usize> {
    let mut seen = LruSet::new(seen_capacity);
    seen.insert(&root.to_string());
    let mut frontier = vec![*root];
    let mut fetched = 0usize;

    while !frontier.is_empty() {
        cancel.checkpoint()?;
        let children = future::try_join_all(
            frontier
                .iter()
                .map(|cid| fetch_links(blocks, loader, cid)),
        )
        .await?;
        fetched += frontier.len();
        trace!(level_size = frontier.len(), fetched, "fetched DAG level");

        let mut next = Vec::new();
        for links in children {
            for child in links {
                if seen.insert(&child.to_string()) {
                    next.push(child);
                }
            }
        }
        frontier = next;
    }

    Ok(fetched)
}

/// Whether `target` is reachable from `root` (the root itself excluded).
///
/// Comparison is by backend key, so a v0 and a v1 CID wrapping the same
/// multihash count as the same block.
pub(crate) async fn dag_contains(
    blocks: &Blockstore,
    loader: &CodecLoader,
    root: &Cid,
    target: &Cid,
    seen_capacity: usize,
    cancel: &CancelToken,
) -> PinResult<bool> {
    let target_key = cid_to_key(target);
    let mut seen = LruSet::new(seen_capacity);
    seen.insert(&root.to_string());
    let mut frontier = vec![*root];

    while !frontier.is_empty() {
        cancel.checkpoint()?;
        let children = future::try_join_all(
            frontier
                .iter()
                .map(|cid| fetch_links(blocks, loader, cid)),
        )
        .await?;

        let mut next = Vec::new();
        for links in children {
            for child in links {
                if cid_to_key(&child) == target_key {
                    return Ok(true);
                }
                if seen.insert(&child.to_string()) {
                    next.push(child);
                }
            }
        }
        frontier = next;
    }

    Ok(false)
}

/// Every backend key reachable from `root`, the root included.
///
/// Used by the garbage collector to mark the closure of the MFS root.
pub(crate) async fn reachable_keys(
    blocks: &Blockstore,
    loader: &CodecLoader,
    root: &Cid,
    seen_capacity: usize,
    cancel: &CancelToken,
) -> PinResult<HashSet<String>> {
    let mut keys = HashSet::new();
    keys.insert(cid_to_key(root));
    let mut seen = LruSet::new(seen_capacity);
    seen.insert(&root.to_string());
    let mut frontier = vec![*root];

    while !frontier.is_empty() {
        cancel.checkpoint()?;
        let children = future::try_join_all(
            frontier
                .iter()
                .map(|cid| fetch_links(blocks, loader, cid)),
        )
        .await?;

        let mut next = Vec::new();
        for links in children {
            for child in links {
                keys.insert(cid_to_key(&child));
                if seen.insert(&child.to_string()) {
                    next.push(child);
                }
            }
        }
        frontier = next;
    }

    Ok(keys)
}
