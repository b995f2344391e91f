//! Garbage collection for the cask persistence layer.
//!
//! Classic mark-and-sweep: compute the retained set (every pinned block,
//! every block reachable from a recursive pin, and the MFS root's closure),
//! then stream the blockstore and delete everything outside it.
//!
//! Correctness rests on one lock: [`GcLock`] is a read/write lock where
//! ordinary writers hold the shared side and a GC run holds the exclusive
//! side. While a sweep is live no pin state can change underneath it, so a
//! block marked at the start of the sweep is never deleted by that run.

pub mod collector;
pub mod error;
pub mod lock;

pub use collector::{
    GarbageCollector, GcEvent, GcStream, DEFAULT_SWEEP_CONCURRENCY, MFS_ROOT_KEY,
};
pub use error::{GcError, GcResult};
pub use lock::GcLock;
