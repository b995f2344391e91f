//! The GC read/write lock.

use std::sync::Arc;

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Coordinates GC runs against ordinary writers within one repo.
///
/// Writers take the shared side; a GC run takes the exclusive side and
/// blocks until every shared holder is done. Guards are owned, so they can
/// ride inside the sweep stream and release on drop whatever the exit path.
#[derive(Clone, Debug, Default)]
pub struct GcLock {
    inner: Arc<RwLock<()>>,
}

impl GcLock {
    /// A fresh, unheld lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the shared (writer) side.
    pub async fn shared(&self) -> OwnedRwLockReadGuard<()> {
        Arc::clone(&self.inner).read_owned().await
    }

    /// Take the exclusive (GC) side, waiting out all shared holders.
    pub async fn exclusive(&self) -> OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.inner).write_owned().await
    }
}
