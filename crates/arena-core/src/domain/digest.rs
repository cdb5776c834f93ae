//! SHA-256 content digests over canonical JSON.
//!
//! Values are first converted to a `serde_json::Value` (object keys end up
//! sorted) and then serialized compactly, so two structurally equal values
//! always hash to the same digest.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::error::ArenaResult;

/// Content digest (SHA-256 hex string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Compute the digest of the canonical JSON form of `value`.
    pub fn of<T: Serialize>(value: &T) -> ArenaResult<Self> {
        Ok(Self::from_bytes(canonical_json(value)?.as_bytes()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compact JSON with sorted object keys.
pub fn canonical_json<T: Serialize>(value: &T) -> ArenaResult<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}
