//! The repo-path lock.
//!
//! Prevents two processes (or two repo handles in one process) from
//! migrating the same on-disk repo concurrently. Acquisition fails fast —
//! callers who already hold a higher-level repo lock opt out with
//! `ignore_lock` instead of blocking.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::debug;

use crate::error::{MigrateError, MigrateResult};

/// Grants exclusive migration rights for one repo path. Released on drop,
/// so every exit path — success, failure, panic unwind — releases it.
#[derive(Debug)]
pub struct LockHandle {
    path: PathBuf,
    registry: Arc<Mutex<HashSet<PathBuf>>>,
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.registry
            .lock()
            .expect("lock poisoned")
            .remove(&self.path);
        debug!(path = %self.path.display(), "repo lock released");
    }
}

/// Hands out path-scoped locks. Injectable so tests can use isolated
/// instances instead of the process-wide registry.
pub trait LockProvider: Send + Sync {
    /// Acquire the lock for `path`, failing fast with
    /// [`MigrateError::LockExists`] if it is already held.
    fn acquire(&self, path: &Path) -> MigrateResult<LockHandle>;
}

/// In-process lock registry keyed by canonical path.
#[derive(Clone, Default)]
pub struct MemoryLockProvider {
    held: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MemoryLockProvider {
    /// A fresh registry holding no locks.
    pub fn new() -> Self {
        Self::default()
    }

    fn canonical(path: &Path) -> PathBuf {
        // Canonicalization needs the path to exist; fall back to the raw
        // path for repos that have not been created yet.
        path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
    }
}

impl LockProvider for MemoryLockProvider {
    fn acquire(&self, path: &Path) -> MigrateResult<LockHandle> {
        let canonical = Self::canonical(path);
        let mut held = self.held.lock().expect("lock poisoned");
        if !held.insert(canonical.clone()) {
            return Err(MigrateError::LockExists(canonical.display().to_string()));
        }
        debug!(path = %canonical.display(), "repo lock acquired");
        Ok(LockHandle {
            path: canonical,
            registry: Arc::clone(&self.held),
        })
    }
}

/// The process-wide lock registry.
pub fn global_provider() -> &'static MemoryLockProvider {
    static GLOBAL: OnceLock<MemoryLockProvider> = OnceLock::new();
    GLOBAL.get_or_init(MemoryLockProvider::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_fast() {
        let provider = MemoryLockProvider::new();
        let _held = provider.acquire(Path::new("/repo/a")).unwrap();
        let err = provider.acquire(Path::new("/repo/a")).unwrap_err();
        assert!(matches!(err, MigrateError::LockExists(_)));
    }

    #[test]
    fn distinct_paths_do_not_contend() {
        let provider = MemoryLockProvider::new();
        let _a = provider.acquire(Path::new("/repo/a")).unwrap();
        let _b = provider.acquire(Path::new("/repo/b")).unwrap();
    }

    #[test]
    fn drop_releases_the_lock() {
        let provider = MemoryLockProvider::new();
        let held = provider.acquire(Path::new("/repo/a")).unwrap();
        drop(held);
        provider.acquire(Path::new("/repo/a")).unwrap();
    }

    #[test]
    fn symlinked_paths_resolve_to_one_lock() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("repo");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("alias");
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(&real, &link).unwrap();
            let provider = MemoryLockProvider::new();
            let _held = provider.acquire(&real).unwrap();
            assert!(provider.acquire(&link).is_err());
        }
    }

    #[test]
    fn provider_instances_are_isolated() {
        let a = MemoryLockProvider::new();
        let b = MemoryLockProvider::new();
        let _held = a.acquire(Path::new("/repo/shared")).unwrap();
        b.acquire(Path::new("/repo/shared")).unwrap();
    }
}
