//! The backend key codec.
//!
//! A block's backend key is `/` followed by the upper-case base32 (RFC 4648,
//! no padding) of the raw multihash bytes. The multibase prefix byte is never
//! included — keys are bare digests, comparable across CID versions: a v0 and
//! a v1 CID wrapping the same multihash map to the same key.

use cid::{Cid, Version};
use data_encoding::BASE32_NOPAD;
use multihash::Multihash;

use crate::error::{TypeError, TypeResult};

/// Multicodec code for the identity ("no-op") hash function.
pub const IDENTITY_CODE: u64 = 0x00;

/// Multicodec code for sha2-256.
pub const SHA2_256_CODE: u64 = 0x12;

/// Multicodec code for raw (opaque bytes, no links).
pub const RAW_CODEC: u64 = 0x55;

/// Multicodec code for dag-pb, the default linking codec.
pub const DAG_PB_CODEC: u64 = 0x70;

/// Multicodec code for dag-cbor.
pub const DAG_CBOR_CODEC: u64 = 0x71;

/// Derive the backend key for a CID.
pub fn cid_to_key(cid: &Cid) -> String {
    let mut key = String::with_capacity(64);
    key.push('/');
    key.push_str(&BASE32_NOPAD.encode(&cid.hash().to_bytes()));
    key
}

/// Recover the multihash encoded in a backend key.
///
/// Inverse of [`cid_to_key`]: for every CID `c`,
/// `key_to_multihash(&cid_to_key(&c))` yields `*c.hash()` exactly.
pub fn key_to_multihash(key: &str) -> TypeResult<Multihash<64>> {
    let body = key
        .strip_prefix('/')
        .ok_or_else(|| TypeError::InvalidKey(key.to_string()))?;
    let raw = BASE32_NOPAD
        .decode(body.as_bytes())
        .map_err(|e| TypeError::InvalidBase32(format!("{key}: {e}")))?;
    Multihash::from_bytes(&raw).map_err(|e| TypeError::InvalidMultihash(format!("{key}: {e}")))
}

/// Rebuild a CID from a multihash plus optional version/codec.
///
/// Pin records omit version and codec when they hold the defaults, so absent
/// values mean v0 / dag-pb. A v0 CID can only wrap a sha2-256 dag-pb block;
/// any other combination normalizes to v1 with the same multihash, which
/// still maps to the same backend key.
pub fn cid_from_parts(
    hash: Multihash<64>,
    version: Option<u64>,
    codec: Option<u64>,
) -> TypeResult<Cid> {
    let version = version.unwrap_or(0);
    let codec = codec.unwrap_or(DAG_PB_CODEC);
    match version {
        0 => {
            if codec == DAG_PB_CODEC && hash.code() == SHA2_256_CODE {
                Cid::new(Version::V0, codec, hash)
                    .map_err(|e| TypeError::InvalidCid(e.to_string()))
            } else {
                Ok(Cid::new_v1(codec, hash))
            }
        }
        1 => Ok(Cid::new_v1(codec, hash)),
        v => Err(TypeError::InvalidCid(format!("unsupported CID version {v}"))),
    }
}

/// Returns `true` if the CID's multihash uses the identity hash function.
///
/// Identity CIDs embed their content in the digest itself; the blockstore
/// never persists them.
pub fn is_identity(cid: &Cid) -> bool {
    cid.hash().code() == IDENTITY_CODE
}

/// The embedded content of an identity CID, or `None` for real hashes.
pub fn identity_payload(cid: &Cid) -> Option<&[u8]> {
    if is_identity(cid) {
        Some(cid.hash().digest())
    } else {
        None
    }
}
