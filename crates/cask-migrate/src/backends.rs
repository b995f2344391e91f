//! The named set of backends a migration operates over.

use std::collections::HashMap;
use std::sync::Arc;

use cask_store::Backend;

use crate::error::{MigrateError, MigrateResult};

/// Well-known backend role names.
pub const ROOT: &str = "root";
pub const BLOCKS: &str = "blocks";
pub const DATASTORE: &str = "datastore";
pub const KEYS: &str = "keys";
pub const PINS: &str = "pins";

/// The backends a repo is assembled from, keyed by role name.
///
/// The root backend carries the version and config records; the rest are
/// whatever the repo layout defines. Migration units address them by name so
/// new roles can be introduced by a migration itself.
#[derive(Clone, Default)]
pub struct Backends {
    stores: HashMap<String, Arc<dyn Backend>>,
}

impl Backends {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under `name`, replacing any previous one.
    pub fn with(mut self, name: impl Into<String>, backend: Arc<dyn Backend>) -> Self {
        self.stores.insert(name.into(), backend);
        self
    }

    /// Look up a backend by role name.
    pub fn get(&self, name: &str) -> MigrateResult<&Arc<dyn Backend>> {
        self.stores
            .get(name)
            .ok_or_else(|| MigrateError::UnknownBackend(name.to_string()))
    }

    /// The root backend (version + config records).
    pub fn root(&self) -> MigrateResult<&Arc<dyn Backend>> {
        self.get(ROOT)
    }

    /// The block backend.
    pub fn blocks(&self) -> MigrateResult<&Arc<dyn Backend>> {
        self.get(BLOCKS)
    }

    /// The general datastore backend.
    pub fn datastore(&self) -> MigrateResult<&Arc<dyn Backend>> {
        self.get(DATASTORE)
    }

    /// The key storage backend.
    pub fn keys(&self) -> MigrateResult<&Arc<dyn Backend>> {
        self.get(KEYS)
    }

    /// The pin-record backend.
    pub fn pins(&self) -> MigrateResult<&Arc<dyn Backend>> {
        self.get(PINS)
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Returns `true` if no backend is registered.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
