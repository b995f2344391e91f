use cid::Cid;
use thiserror::Error;

use cask_store::StoreError;
use cask_types::{Cancelled, TypeError};

/// Errors from pin operations and DAG traversal.
#[derive(Debug, Error)]
pub enum PinError {
    /// Underlying block or pin store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No link codec registered for this multicodec code.
    #[error("no codec registered for code {0:#x}")]
    CodecNotFound(u64),

    /// A block's links could not be decoded.
    #[error("failed to decode links of {cid}: {reason}")]
    LinkDecode { cid: Cid, reason: String },

    /// A stored pin record could not be decoded.
    #[error("corrupt pin record at {key}: {reason}")]
    RecordDecode { key: String, reason: String },

    /// A pin record could not be encoded.
    #[error("failed to encode pin record: {0}")]
    RecordEncode(String),

    /// A pin-store key could not be mapped back to a multihash.
    #[error(transparent)]
    Key(#[from] TypeError),

    /// The operation observed a cancelled token.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Result alias for pin operations.
pub type PinResult<T> = Result<T, PinError>;
