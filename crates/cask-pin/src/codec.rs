//! Format-agnostic link extraction.
//!
//! The pin manager never interprets block payloads itself. It asks a
//! [`CodecLoader`] for the [`LinkCodec`] matching a CID's codec code and
//! lets that codec enumerate child CIDs. Repo assembly can register codecs
//! for any block format; the built-ins cover dag-cbor and raw.

use std::sync::Arc;

use cid::Cid;
use serde_cbor::Value;
use thiserror::Error;

use cask_types::{DAG_CBOR_CODEC, RAW_CODEC};

use crate::error::{PinError, PinResult};

/// A block's links could not be extracted.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct LinkError(pub String);

/// Extracts child CIDs from one block format.
pub trait LinkCodec: Send + Sync {
    /// The multicodec code this codec handles.
    fn code(&self) -> u64;

    /// Every CID the block links to, in encounter order.
    fn links(&self, block: &[u8]) -> Result<Vec<Cid>, LinkError>;
}

impl std::fmt::Debug for dyn LinkCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LinkCodec")
    }
}

/// Maps a multicodec code to a link codec. Unknown codes are a hard error —
/// traversal must fail loudly rather than silently under-walk a DAG.
pub type CodecLoader = Arc<dyn Fn(u64) -> PinResult<Arc<dyn LinkCodec>> + Send + Sync>;

/// A loader knowing the built-in codecs (dag-cbor, raw).
pub fn default_loader() -> CodecLoader {
    let dag_cbor: Arc<dyn LinkCodec> = Arc::new(DagCborLinks);
    let raw: Arc<dyn LinkCodec> = Arc::new(RawLinks);
    Arc::new(move |code| match code {
        DAG_CBOR_CODEC => Ok(Arc::clone(&dag_cbor)),
        RAW_CODEC => Ok(Arc::clone(&raw)),
        other => Err(PinError::CodecNotFound(other)),
    })
}

/// dag-cbor link scanner.
///
/// Links are CBOR tag 42 wrapping a byte string whose first byte is the
/// identity-multibase prefix (`0x00`) followed by the CID bytes. The whole
/// value tree is walked; links may appear at any nesting depth.
pub struct DagCborLinks;

impl DagCborLinks {
    fn collect(value: &Value, out: &mut Vec<Cid>) -> Result<(), LinkError> {
        match value {
            Value::Tag(42, inner) => match inner.as_ref() {
                Value::Bytes(bytes) => {
                    let raw = bytes.strip_prefix(&[0u8][..]).ok_or_else(|| {
                        LinkError("link bytes missing identity multibase prefix".to_string())
                    })?;
                    let cid = Cid::try_from(raw)
                        .map_err(|e| LinkError(format!("invalid link cid: {e}")))?;
                    out.push(cid);
                    Ok(())
                }
                other => Err(LinkError(format!(
                    "tag 42 must wrap a byte string, found {other:?}"
                ))),
            },
            Value::Tag(_, inner) => Self::collect(inner, out),
            Value::Array(items) => {
                for item in items {
                    Self::collect(item, out)?;
                }
                Ok(())
            }
            Value::Map(map) => {
                // dag-cbor map keys are strings; only values can hold links.
                for item in map.values() {
                    Self::collect(item, out)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl LinkCodec for DagCborLinks {
    fn code(&self) -> u64 {
        DAG_CBOR_CODEC
    }

    fn links(&self, block: &[u8]) -> Result<Vec<Cid>, LinkError> {
        let value: Value = serde_cbor::from_slice(block)
            .map_err(|e| LinkError(format!("invalid dag-cbor: {e}")))?;
        let mut out = Vec::new();
        Self::collect(&value, &mut out)?;
        Ok(out)
    }
}

/// Raw blocks are leaves: no links, ever.
pub struct RawLinks;

impl LinkCodec for RawLinks {
    fn code(&self) -> u64 {
        RAW_CODEC
    }

    fn links(&self, _block: &[u8]) -> Result<Vec<Cid>, LinkError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_types::{Multihash, SHA2_256_CODE};
    use std::collections::BTreeMap;

    fn some_cid(seed: u8) -> Cid {
        let mh = Multihash::wrap(SHA2_256_CODE, &[seed; 32]).unwrap();
        Cid::new_v1(RAW_CODEC, mh)
    }

    fn link_value(cid: &Cid) -> Value {
        let mut bytes = vec![0u8];
        bytes.extend(cid.to_bytes());
        Value::Tag(42, Box::new(Value::Bytes(bytes)))
    }

    #[test]
    fn extracts_links_from_nested_structure() {
        let a = some_cid(1);
        let b = some_cid(2);

        let mut map = BTreeMap::new();
        map.insert(
            Value::Text("links".to_string()),
            Value::Array(vec![link_value(&a), link_value(&b)]),
        );
        map.insert(Value::Text("name".to_string()), Value::Text("x".to_string()));
        let block = serde_cbor::to_vec(&Value::Map(map)).unwrap();

        let links = DagCborLinks.links(&block).unwrap();
        assert_eq!(links, vec![a, b]);
    }

    #[test]
    fn block_without_links_yields_empty() {
        let block = serde_cbor::to_vec(&Value::Text("leaf".to_string())).unwrap();
        assert!(DagCborLinks.links(&block).unwrap().is_empty());
    }

    #[test]
    fn missing_multibase_prefix_is_an_error() {
        let cid = some_cid(3);
        let tagged = Value::Tag(42, Box::new(Value::Bytes(cid.to_bytes())));
        let block = serde_cbor::to_vec(&tagged).unwrap();
        assert!(DagCborLinks.links(&block).is_err());
    }

    #[test]
    fn tag_42_on_non_bytes_is_an_error() {
        let tagged = Value::Tag(42, Box::new(Value::Text("nope".to_string())));
        let block = serde_cbor::to_vec(&tagged).unwrap();
        assert!(DagCborLinks.links(&block).is_err());
    }

    #[test]
    fn invalid_cbor_is_an_error() {
        assert!(DagCborLinks.links(b"\xff\x00\x01").is_err());
    }

    #[test]
    fn raw_blocks_have_no_links() {
        assert!(RawLinks.links(b"anything at all").unwrap().is_empty());
    }

    #[test]
    fn default_loader_resolves_builtins_and_rejects_unknown() {
        let loader = default_loader();
        assert_eq!(loader(DAG_CBOR_CODEC).unwrap().code(), DAG_CBOR_CODEC);
        assert_eq!(loader(RAW_CODEC).unwrap().code(), RAW_CODEC);
        assert!(matches!(
            loader(0x70).unwrap_err(),
            PinError::CodecNotFound(0x70)
        ));
    }
}
