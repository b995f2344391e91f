use thiserror::Error;

use cask_pin::PinError;
use cask_store::StoreError;
use cask_types::Cancelled;

/// Fatal errors from a GC run.
///
/// Only failures acquiring the lock or *building* the mark set abort a run;
/// individual sweep deletions report through the event stream instead.
#[derive(Debug, Error)]
pub enum GcError {
    /// Mark phase failed walking pin state.
    #[error(transparent)]
    Pin(#[from] PinError),

    /// Mark phase failed reading a backend.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The MFS root pointer exists but does not hold a valid CID.
    #[error("invalid MFS root pointer: {0}")]
    MfsRoot(String),

    /// The run observed a cancelled token.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Result alias for GC operations.
pub type GcResult<T> = Result<T, GcError>;
