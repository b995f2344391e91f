//! On-disk layout migrations for the cask persistence layer.
//!
//! A repo's layout version is a single integer stored in the root backend.
//! Migration units transform the layout between adjacent versions; the
//! [`Migrator`] applies them forward (ascending) or in reverse (descending),
//! gated by a repo-path lock so two processes never migrate the same repo
//! concurrently.
//!
//! The version bookkeeping is crash-consistent by construction:
//!
//! - apply fails at unit `V` → the stored version becomes `V − 1`, the last
//!   unit known to have fully completed;
//! - revert fails at unit `V` → the stored version stays `V`, because the
//!   repo cannot be assumed to have left `V` (a unit's `revert` is treated
//!   as all-or-nothing — a contract migration authors must uphold).
//!
//! A retried run therefore resumes exactly where the failed one stopped.

pub mod backends;
pub mod engine;
pub mod error;
pub mod lock;
pub mod migration;
pub mod version;

pub use backends::Backends;
pub use engine::{MigrateOptions, Migrator};
pub use error::{MigrateError, MigrateResult};
pub use lock::{global_provider, LockHandle, LockProvider, MemoryLockProvider};
pub use migration::{Migration, ProgressFn, ProgressHandle};
pub use version::{
    auto_migrate_enabled, init_repo, is_initialized, repo_version, set_repo_version,
    AUTO_MIGRATE_KEY, CONFIG_KEY, VERSION_KEY,
};
