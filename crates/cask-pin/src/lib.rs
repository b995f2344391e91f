//! Pin management for the cask persistence layer.
//!
//! A pin marks content the repository must retain. Two kinds are stored —
//! *direct* (one block) and *recursive* (a block and everything reachable
//! from it) — and one is derived at query time: *indirect*, a block kept
//! alive only because some recursive pin reaches it. Recursion beats
//! indirection: a recursively pinned block is never reported as indirect.
//!
//! Pin records live in their own backend, keyed exactly like blocks, encoded
//! as minimal CBOR maps (fields are omitted when they hold the defaults).
//! Records never store indirect pins.
//!
//! DAG traversal is format-agnostic: a [`CodecLoader`] maps a CID's codec
//! code to a [`LinkCodec`] that extracts child CIDs from a block. Traversal
//! failures (missing block, unknown codec) are hard errors — a partially
//! walked pin is worse than none.
//!
//! [`PinnedBlockstore`] is the deletion guard: a decorator over the raw
//! blockstore that refuses to delete pinned content.

pub mod codec;
pub mod error;
pub mod guard;
pub mod lru;
pub mod manager;
pub mod record;
mod traversal;

pub use codec::{default_loader, CodecLoader, DagCborLinks, LinkCodec, LinkError, RawLinks};
pub use error::{PinError, PinResult};
pub use guard::PinnedBlockstore;
pub use lru::{LruSet, DEFAULT_SEEN_CAPACITY};
pub use manager::{PinManager, PinOptions, PinStatus, PinStream};
pub use record::{PinKind, PinRecord, RECURSIVE_DEPTH};
