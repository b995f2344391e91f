//! Repo version and config accessors over the root backend.

use std::sync::Arc;

use bytes::Bytes;
use cask_store::{Backend, StoreError};
use tracing::debug;

use crate::error::{MigrateError, MigrateResult};

/// Root-backend key holding the layout version (ASCII decimal).
pub const VERSION_KEY: &str = "/version";

/// Root-backend key holding the repo config (JSON document).
pub const CONFIG_KEY: &str = "/config";

/// Config field gating automatic migration on open.
pub const AUTO_MIGRATE_KEY: &str = "repoAutoMigrate";

/// Read the stored layout version.
///
/// A missing record means the repo was never initialized — version and
/// config are written together by [`init_repo`] and the version never
/// exists on its own.
pub async fn repo_version(root: &Arc<dyn Backend>) -> MigrateResult<u64> {
    match root.get(VERSION_KEY).await {
        Ok(bytes) => {
            let text = std::str::from_utf8(&bytes)
                .map_err(|e| MigrateError::InvalidValue(format!("version record: {e}")))?;
            text.trim()
                .parse::<u64>()
                .map_err(|e| MigrateError::InvalidValue(format!("version record {text:?}: {e}")))
        }
        Err(StoreError::NotFound(_)) => Err(MigrateError::NotInitializedRepo),
        Err(e) => Err(e.into()),
    }
}

/// Persist the layout version.
pub async fn set_repo_version(root: &Arc<dyn Backend>, version: u64) -> MigrateResult<()> {
    root.put(VERSION_KEY, Bytes::from(version.to_string()))
        .await?;
    debug!(version, "stored repo version");
    Ok(())
}

/// Write the config and version records, marking the repo initialized.
pub async fn init_repo(
    root: &Arc<dyn Backend>,
    config: &serde_json::Value,
    version: u64,
) -> MigrateResult<()> {
    let config = serde_json::to_vec(config)
        .map_err(|e| MigrateError::InvalidValue(format!("config: {e}")))?;
    root.put(CONFIG_KEY, Bytes::from(config)).await?;
    set_repo_version(root, version).await
}

/// Returns `true` if both the config and version records exist.
pub async fn is_initialized(root: &Arc<dyn Backend>) -> MigrateResult<bool> {
    Ok(root.has(CONFIG_KEY).await? && root.has(VERSION_KEY).await?)
}

/// The `repoAutoMigrate` config flag; absent config or field means `true`.
pub async fn auto_migrate_enabled(root: &Arc<dyn Backend>) -> MigrateResult<bool> {
    match root.get(CONFIG_KEY).await {
        Ok(bytes) => {
            let config: serde_json::Value = serde_json::from_slice(&bytes)
                .map_err(|e| MigrateError::InvalidValue(format!("config record: {e}")))?;
            Ok(config
                .get(AUTO_MIGRATE_KEY)
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(true))
        }
        Err(StoreError::NotFound(_)) => Ok(true),
        Err(e) => Err(e.into()),
    }
}
