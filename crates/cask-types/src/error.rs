use thiserror::Error;

/// Errors produced by CID/key codec operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The backend key is not in the expected `/BASE32` shape.
    #[error("invalid backend key: {0}")]
    InvalidKey(String),

    /// The key body is not valid upper-case base32.
    #[error("invalid base32 in key: {0}")]
    InvalidBase32(String),

    /// The decoded bytes are not a well-formed multihash.
    #[error("invalid multihash: {0}")]
    InvalidMultihash(String),

    /// A CID could not be assembled from its parts.
    #[error("invalid cid: {0}")]
    InvalidCid(String),
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;
