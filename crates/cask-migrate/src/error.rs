use thiserror::Error;

use cask_store::StoreError;
use cask_types::Cancelled;

/// Errors from migration planning and execution.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// A required argument was missing or empty.
    #[error("required parameter missing: {0}")]
    RequiredParameter(&'static str),

    /// An argument was present but unusable (bad target version, wrong
    /// migration direction, incomplete migration set, ...).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A unit in the revert range defines no `revert`.
    #[error("migration {0} is not reversible")]
    NonReversibleMigration(u64),

    /// The root backend has no version record.
    #[error("repo is not initialized")]
    NotInitializedRepo,

    /// The repo-path lock is already held.
    #[error("lock already held for {0}")]
    LockExists(String),

    /// The repo version differs from the expected one and auto-migrate is
    /// disabled.
    #[error("repo is at version {actual}, expected {expected}")]
    VersionMismatch { actual: u64, expected: u64 },

    /// No backend registered under this name.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// A unit's `migrate`/`revert` body failed. The stored repo version has
    /// already been updated to the best-known state.
    #[error("migration {version} failed: {source}")]
    Execution {
        version: u64,
        #[source]
        source: Box<MigrateError>,
    },

    /// Backend failure during bookkeeping or inside a unit.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation observed a cancelled token.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// Unit-specific failure with no better kind.
    #[error("{0}")]
    Other(String),
}

/// Result alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrateError>;
