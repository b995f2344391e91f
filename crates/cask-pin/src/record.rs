//! Stored pin records and pin classification.

use std::collections::BTreeMap;

use cid::{Cid, Version};
use serde::{Deserialize, Serialize};
use serde_cbor::Value;

use cask_types::{cid_from_parts, Multihash, TypeResult, DAG_PB_CODEC};

use crate::error::{PinError, PinResult};

/// Depth sentinel meaning "pin the full reachability closure".
pub const RECURSIVE_DEPTH: u64 = u64::MAX;

/// How a CID is (or would be) pinned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PinKind {
    /// A depth-0 record: retain this single block.
    Direct,
    /// A depth-∞ record: retain this block and everything reachable from it.
    Recursive,
    /// Derived: retained only because a recursive pin reaches it.
    Indirect,
    /// Union of the above.
    All,
}

impl PinKind {
    /// Whether a stored record's depth satisfies this kind.
    ///
    /// Indirect pins are never stored, so only `Direct`, `Recursive` and
    /// `All` can match a record.
    pub fn matches_depth(self, depth: u64) -> bool {
        match self {
            Self::Direct => depth == 0,
            Self::Recursive => depth == RECURSIVE_DEPTH,
            Self::Indirect => false,
            Self::All => depth == 0 || depth == RECURSIVE_DEPTH,
        }
    }
}

impl std::fmt::Display for PinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Recursive => write!(f, "recursive"),
            Self::Indirect => write!(f, "indirect"),
            Self::All => write!(f, "all"),
        }
    }
}

/// A pin record, stored under the pinned CID's backend key.
///
/// Encoded as a compact CBOR map. `version` and `codec` are written only
/// when they differ from the defaults (v0 / dag-pb); decoders fill absent
/// fields back in from those defaults. At most one record exists per CID —
/// writing a record overwrites any previous one, which is how recursively
/// pinning an already-directly-pinned CID upgrades it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinRecord {
    /// `0` for direct, [`RECURSIVE_DEPTH`] for recursive.
    pub depth: u64,
    /// CID version, present only when ≠ 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// CID codec, present only when ≠ dag-pb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<u64>,
    /// Opaque caller-supplied metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
}

impl PinRecord {
    /// A depth-0 record for `cid`.
    pub fn direct(cid: &Cid, metadata: Option<BTreeMap<String, Value>>) -> Self {
        Self::for_cid(0, cid, metadata)
    }

    /// A depth-∞ record for `cid`.
    pub fn recursive(cid: &Cid, metadata: Option<BTreeMap<String, Value>>) -> Self {
        Self::for_cid(RECURSIVE_DEPTH, cid, metadata)
    }

    fn for_cid(depth: u64, cid: &Cid, metadata: Option<BTreeMap<String, Value>>) -> Self {
        let version = match cid.version() {
            Version::V0 => None,
            Version::V1 => Some(1),
        };
        let codec = (cid.codec() != DAG_PB_CODEC).then(|| cid.codec());
        Self {
            depth,
            version,
            codec,
            metadata,
        }
    }

    /// Whether this record is a direct pin.
    pub fn is_direct(&self) -> bool {
        self.depth == 0
    }

    /// Whether this record is a recursive pin.
    pub fn is_recursive(&self) -> bool {
        self.depth == RECURSIVE_DEPTH
    }

    /// Rebuild the pinned CID from the record plus the key's multihash.
    pub fn to_cid(&self, hash: Multihash<64>) -> TypeResult<Cid> {
        cid_from_parts(hash, self.version, self.codec)
    }

    /// Encode to compact CBOR.
    pub fn encode(&self) -> PinResult<Vec<u8>> {
        serde_cbor::to_vec(self).map_err(|e| PinError::RecordEncode(e.to_string()))
    }

    /// Decode from CBOR. `key` is only used for error context.
    pub fn decode(key: &str, bytes: &[u8]) -> PinResult<Self> {
        serde_cbor::from_slice(bytes).map_err(|e| PinError::RecordDecode {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}
