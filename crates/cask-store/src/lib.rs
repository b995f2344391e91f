//! Block storage for the cask persistence layer.
//!
//! Two layers live here:
//!
//! - [`Backend`] — the byte-oriented key/value contract every storage
//!   adapter (filesystem, leveled KV, sharded, object storage) implements.
//!   The core only ever sees this trait; concrete adapters are constructed
//!   and injected by the repo assembly layer. [`MemoryBackend`] is the
//!   in-process implementation used by tests and embedding.
//! - [`Blockstore`] — the CID-keyed content store wrapping a backend. It
//!   owns the CID↔key translation and the identity-multihash short-circuit:
//!   identity CIDs carry their content in the digest and are never written
//!   to or read from the backend.
//!
//! Deletion guarding lives one crate up (`cask-pin`), wrapped *around* the
//! blockstore so the guard cannot be bypassed by construction.

pub mod backend;
pub mod blockstore;
pub mod error;
pub mod memory;

pub use backend::{Backend, BackendBatch, EntryStream, KeyStream, Query};
pub use blockstore::{BlockStream, Blockstore, CidStream};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryBackend;
