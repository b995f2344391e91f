//! The migration engine: planning, locking and execution.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use cask_types::CancelToken;

use crate::backends::Backends;
use crate::error::{MigrateError, MigrateResult};
use crate::lock::{LockHandle, LockProvider};
use crate::migration::{Migration, ProgressFn, ProgressHandle};
use crate::version::{auto_migrate_enabled, repo_version, set_repo_version};

/// Options shared by [`Migrator::apply`] and [`Migrator::revert`].
#[derive(Clone, Default)]
pub struct MigrateOptions {
    /// Skip the repo-path lock. For callers that already hold a
    /// higher-level repo lock.
    pub ignore_lock: bool,
    /// Validate the full plan but execute nothing and take no lock.
    pub dry_run: bool,
    /// Progress sink, invoked as `(version, percent, message)`.
    pub progress: Option<ProgressFn>,
}

/// Applies or reverts an ordered set of migration units.
pub struct Migrator {
    migrations: Vec<Arc<dyn Migration>>,
    lock_provider: Arc<dyn LockProvider>,
}

impl Migrator {
    /// Build a migrator over `migrations`.
    ///
    /// Units are sorted by version; zero or duplicate versions are rejected
    /// here so planning can assume a strictly increasing sequence.
    pub fn new(
        mut migrations: Vec<Arc<dyn Migration>>,
        lock_provider: Arc<dyn LockProvider>,
    ) -> MigrateResult<Self> {
        migrations.sort_by_key(|m| m.version());
        for pair in migrations.windows(2) {
            if pair[0].version() == pair[1].version() {
                return Err(MigrateError::InvalidValue(format!(
                    "duplicate migration version {}",
                    pair[0].version()
                )));
            }
        }
        if migrations.iter().any(|m| m.version() == 0) {
            return Err(MigrateError::InvalidValue(
                "migration versions must be positive".to_string(),
            ));
        }
        Ok(Self {
            migrations,
            lock_provider,
        })
    }

    /// The highest version any registered unit migrates to.
    pub fn latest_version(&self) -> Option<u64> {
        self.migrations.last().map(|m| m.version())
    }

    fn validate_args(path: &Path, backends: &Backends, target: u64) -> MigrateResult<()> {
        if path.as_os_str().is_empty() {
            return Err(MigrateError::RequiredParameter("path"));
        }
        if backends.is_empty() {
            return Err(MigrateError::RequiredParameter("backends"));
        }
        if target == 0 {
            return Err(MigrateError::InvalidValue(
                "target version must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    /// Units migrating `current → target`, ascending, verified contiguous.
    fn plan_forward(&self, current: u64, target: u64) -> MigrateResult<Vec<Arc<dyn Migration>>> {
        let plan: Vec<_> = self
            .migrations
            .iter()
            .filter(|m| m.version() > current && m.version() <= target)
            .cloned()
            .collect();
        Self::check_contiguous(&plan, current, target)?;
        Ok(plan)
    }

    /// Units reverting `current → target`, descending, verified contiguous.
    fn plan_backward(&self, current: u64, target: u64) -> MigrateResult<Vec<Arc<dyn Migration>>> {
        let mut plan: Vec<_> = self
            .migrations
            .iter()
            .filter(|m| m.version() > target && m.version() <= current)
            .cloned()
            .collect();
        Self::check_contiguous(&plan, target, current)?;
        plan.reverse();
        Ok(plan)
    }

    fn check_contiguous(
        plan: &[Arc<dyn Migration>],
        low: u64,
        high: u64,
    ) -> MigrateResult<()> {
        if plan.len() as u64 != high - low {
            return Err(MigrateError::InvalidValue(format!(
                "incomplete migration set: need versions {}..={}, found {} unit(s)",
                low + 1,
                high,
                plan.len()
            )));
        }
        for (offset, unit) in plan.iter().enumerate() {
            let expected = low + 1 + offset as u64;
            if unit.version() != expected {
                return Err(MigrateError::InvalidValue(format!(
                    "migration set has a gap: expected version {expected}, found {}",
                    unit.version()
                )));
            }
        }
        Ok(())
    }

    fn maybe_lock(
        &self,
        path: &Path,
        opts: &MigrateOptions,
    ) -> MigrateResult<Option<LockHandle>> {
        if opts.dry_run || opts.ignore_lock {
            Ok(None)
        } else {
            Ok(Some(self.lock_provider.acquire(path)?))
        }
    }

    /// Migrate the repo forward to `target`.
    ///
    /// No-op when already there; refuses to move backward (use
    /// [`revert`](Migrator::revert)). On failure at unit `V` the stored
    /// version becomes `V − 1` before the error is returned.
    pub async fn apply(
        &self,
        path: &Path,
        backends: &Backends,
        target: u64,
        opts: &MigrateOptions,
        cancel: &CancelToken,
    ) -> MigrateResult<()> {
        Self::validate_args(path, backends, target)?;
        let root = backends.root()?;
        let current = repo_version(root).await?;

        if current == target {
            info!(version = current, "repo already at target version");
            return Ok(());
        }
        if current > target {
            return Err(MigrateError::InvalidValue(format!(
                "repo version {current} is above target {target}; use revert"
            )));
        }
        let plan = self.plan_forward(current, target)?;

        let _lock = self.maybe_lock(path, opts)?;
        for unit in plan {
            let version = unit.version();
            info!(
                version,
                description = unit.description(),
                dry_run = opts.dry_run,
                "applying migration"
            );
            if opts.dry_run {
                continue;
            }

            let progress = ProgressHandle::new(version, opts.progress.clone());
            let result = async {
                cancel.checkpoint()?;
                unit.migrate(backends, &progress, cancel).await
            }
            .await;

            if let Err(e) = result {
                // The previous unit is the last one known to have fully
                // completed; record it so a retry resumes there.
                warn!(version, error = %e, "migration failed");
                // The unit's own error stays primary even when the version
                // record cannot be written back.
                if let Err(record) = set_repo_version(root, version - 1).await {
                    warn!(version, error = %record, "failed to record version after migration failure");
                }
                return Err(MigrateError::Execution {
                    version,
                    source: Box::new(e),
                });
            }
        }

        if !opts.dry_run {
            set_repo_version(root, target).await?;
            info!(version = target, "migration complete");
        }
        Ok(())
    }

    /// Revert the repo backward to `target`.
    ///
    /// Every unit in the range must be reversible — checked up front, even
    /// in dry-run mode, before anything executes. On failure at unit `V`
    /// the stored version becomes `V`: the repo cannot be assumed to have
    /// left `V` (see the crate docs on revert atomicity).
    pub async fn revert(
        &self,
        path: &Path,
        backends: &Backends,
        target: u64,
        opts: &MigrateOptions,
        cancel: &CancelToken,
    ) -> MigrateResult<()> {
        Self::validate_args(path, backends, target)?;
        let root = backends.root()?;
        let current = repo_version(root).await?;

        if current == target {
            info!(version = current, "repo already at target version");
            return Ok(());
        }
        if current < target {
            return Err(MigrateError::InvalidValue(format!(
                "repo version {current} is below target {target}; use apply"
            )));
        }
        let plan = self.plan_backward(current, target)?;
        if let Some(unit) = plan.iter().find(|m| !m.reversible()) {
            return Err(MigrateError::NonReversibleMigration(unit.version()));
        }

        let _lock = self.maybe_lock(path, opts)?;
        for unit in plan {
            let version = unit.version();
            info!(
                version,
                description = unit.description(),
                dry_run = opts.dry_run,
                "reverting migration"
            );
            if opts.dry_run {
                continue;
            }

            let progress = ProgressHandle::new(version, opts.progress.clone());
            let result = async {
                cancel.checkpoint()?;
                unit.revert(backends, &progress, cancel).await
            }
            .await;

            if let Err(e) = result {
                warn!(version, error = %e, "revert failed");
                if let Err(record) = set_repo_version(root, version).await {
                    warn!(version, error = %record, "failed to record version after revert failure");
                }
                return Err(MigrateError::Execution {
                    version,
                    source: Box::new(e),
                });
            }
        }

        if !opts.dry_run {
            set_repo_version(root, target).await?;
            info!(version = target, "revert complete");
        }
        Ok(())
    }

    /// The on-open version gate.
    ///
    /// No-op when the repo is already at `target`. Otherwise applies or
    /// reverts as needed when the `repoAutoMigrate` config flag allows it,
    /// and fails with [`MigrateError::VersionMismatch`] when it does not.
    pub async fn ensure_version(
        &self,
        path: &Path,
        backends: &Backends,
        target: u64,
        opts: &MigrateOptions,
        cancel: &CancelToken,
    ) -> MigrateResult<()> {
        Self::validate_args(path, backends, target)?;
        let root = backends.root()?;
        let current = repo_version(root).await?;
        if current == target {
            return Ok(());
        }
        if !auto_migrate_enabled(root).await? {
            return Err(MigrateError::VersionMismatch {
                actual: current,
                expected: target,
            });
        }
        if current < target {
            self.apply(path, backends, target, opts, cancel).await
        } else {
            self.revert(path, backends, target, opts, cancel).await
        }
    }
}
