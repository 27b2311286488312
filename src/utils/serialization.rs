// src/utils/serialization.rs
//! Serialization utilities.
//!
//! Signed payloads are plain structs whose `serde_json` encoding is
//! deterministic (fixed field order, `BTreeMap` for maps). These helpers
//! keep that encoding in one place.

use serde::{Deserialize, Serialize};

/// Serializes a value to the JSON bytes that are signed and verified.
///
/// # Returns
/// - `Ok(Vec<u8>)` with the compact JSON encoding
/// - `Err(serde_json::Error)` if serialization fails
pub fn canonical_bytes<T: Serialize>(data: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(data)
}

/// Serializes a value to a pretty-printed JSON string, as written to disk.
pub fn serialize_pretty<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

/// Deserializes a value from JSON bytes.
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a [u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(data)
}
