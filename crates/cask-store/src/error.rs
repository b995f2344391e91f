use cid::Cid;
use thiserror::Error;

use cask_types::{Cancelled, TypeError};

/// Errors from backend and blockstore operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend has no value under this key.
    #[error("key not found: {0}")]
    NotFound(String),

    /// The blockstore has no block for this CID.
    #[error("block not found: {0}")]
    BlockNotFound(Cid),

    /// Deletion refused: the block is pinned.
    #[error("block is pinned: {0}")]
    Pinned(Cid),

    /// The backend is closed.
    #[error("backend is closed")]
    Closed,

    /// A backend key could not be decoded back into a multihash.
    #[error(transparent)]
    Key(#[from] TypeError),

    /// The operation observed a cancelled token.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// Backend-specific failure (network, corruption, ...).
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
