//! Shared primitives for the cask persistence layer.
//!
//! Every block in a cask repository is addressed by a [`Cid`] (version +
//! codec + multihash) but stored in a backend keyed by a plain string. This
//! crate owns that bidirectional mapping, the identity-multihash helpers the
//! blockstore short-circuits on, and the cooperative [`CancelToken`] threaded
//! through every long-running operation.
//!
//! # Design Rules
//!
//! 1. The key codec is exact: `key_to_multihash(cid_to_key(c))` returns the
//!    CID's multihash byte-for-byte, for every valid CID.
//! 2. Keys never carry version/codec — those are reconstructed on read-back
//!    from defaults (v0 / dag-pb) unless a separate record preserves them.
//! 3. Cancellation is cooperative: in-flight backend calls finish, no new
//!    ones are issued once the token is signalled.

pub mod cancel;
pub mod error;
pub mod key;

pub use cancel::{CancelToken, Cancelled};
pub use error::{TypeError, TypeResult};
pub use key::{
    cid_from_parts, cid_to_key, identity_payload, is_identity, key_to_multihash, DAG_CBOR_CODEC,
    DAG_PB_CODEC, IDENTITY_CODE, RAW_CODEC, SHA2_256_CODE,
};

// Re-export the foreign types that appear throughout the public API.
pub use cid::{Cid, Version};
pub use multihash::Multihash;
