//! The migration-unit contract and progress reporting.

use std::sync::Arc;

use async_trait::async_trait;

use cask_types::CancelToken;

use crate::backends::Backends;
use crate::error::{MigrateError, MigrateResult};

/// Caller-facing progress callback: `(version, percent, message)`.
///
/// `percent` is pre-formatted to two decimals ("42.00") so every consumer
/// renders it identically.
pub type ProgressFn = Arc<dyn Fn(u64, &str, &str) + Send + Sync>;

/// The progress reporter handed to a unit's `migrate`/`revert` body.
///
/// Units report `(percent, message)`; the handle stamps the unit version and
/// formats the percentage before forwarding to the caller's [`ProgressFn`].
#[derive(Clone)]
pub struct ProgressHandle {
    version: u64,
    callback: Option<ProgressFn>,
}

impl ProgressHandle {
    pub(crate) fn new(version: u64, callback: Option<ProgressFn>) -> Self {
        Self { version, callback }
    }

    /// Report progress. A no-op when the caller installed no callback.
    pub fn report(&self, percent: f64, message: &str) {
        if let Some(callback) = &self.callback {
            callback(self.version, &format!("{percent:.2}"), message);
        }
    }
}

/// One ordered, versioned transformation of the on-disk layout.
///
/// Units are applied in ascending `version` order and reverted in descending
/// order; the set applied over any range must be contiguous. A unit that
/// keeps the default `revert` is irreversible: the engine refuses to plan a
/// revert across it.
#[async_trait]
pub trait Migration: Send + Sync {
    /// The layout version this unit migrates *to*. Must be positive.
    fn version(&self) -> u64;

    /// Human-readable summary, for logs and progress output.
    fn description(&self) -> &str;

    /// Whether this unit defines a `revert`.
    fn reversible(&self) -> bool {
        true
    }

    /// Transform the layout from `version() - 1` to `version()`.
    async fn migrate(
        &self,
        backends: &Backends,
        progress: &ProgressHandle,
        cancel: &CancelToken,
    ) -> MigrateResult<()>;

    /// Undo [`migrate`](Migration::migrate), returning the layout to
    /// `version() - 1`. Must be all-or-nothing: the engine's failure
    /// bookkeeping assumes a failed revert left version `version()` intact.
    async fn revert(
        &self,
        backends: &Backends,
        progress: &ProgressHandle,
        cancel: &CancelToken,
    ) -> MigrateResult<()> {
        let _ = (backends, progress, cancel);
        Err(MigrateError::NonReversibleMigration(self.version()))
    }
}
