//! Canonical serialization and chain digests.
//!
//! Content is converted to a `serde_json::Value`, object keys are sorted recursively,
//! and the result is written compactly. The chain digest is
//! `blake3(canonical(content) || previous_hash)` rendered as lowercase hex.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::constants::GENESIS_PREVIOUS_HASH;

/// Canonical byte encoding of any serializable value.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    serde_json::to_vec(&canonicalize(value))
}

/// Recursively sort object keys.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Digest of canonical content linked to the previous hash in its chain.
pub fn chain_hash(canonical: &[u8], previous_hash: Option<&str>) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(canonical);
    hasher.update(previous_hash.unwrap_or(GENESIS_PREVIOUS_HASH).as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Canonicalize `value` and compute its chain digest.
pub fn hash_linked<T: Serialize + ?Sized>(
    value: &T,
    previous_hash: Option<&str>,
) -> Result<String, serde_json::Error> {
    let bytes = canonical_bytes(value)?;
    Ok(chain_hash(&bytes, previous_hash))
}

/// Unlinked digest of a value's canonical form.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    hash_linked(value, None)
}
