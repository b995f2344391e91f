//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// The operation observed a signalled [`CancelToken`] and stopped.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("operation cancelled")]
pub struct Cancelled;

/// A cloneable abort signal shared between a caller and a long-running
/// operation (recursive pinning, GC, migration).
///
/// Cancellation is cooperative: operations call [`checkpoint`] before issuing
/// new backend calls and stop when it fails. In-flight calls are allowed to
/// finish; no consistency of intermediate state is guaranteed after a cancel.
///
/// [`checkpoint`]: CancelToken::checkpoint
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, unsignalled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent; all clones observe it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`cancel`](CancelToken::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Fail with [`Cancelled`] if the token has been signalled.
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
