//! crates/gz_store/src/hasher.rs
//! Deterministic SHA-256 digests over canonical bytes. Hex digests are
//! lowercase, 64 chars.
//!
//! - `sha256_hex` for raw bytes.
//! - `sha256_canonical` for serializable values (goes through
//!   `canonical_json`, so semantically equal values hash equal).
//! - `polygon_digest` is the evidence digest stored on section events.

use serde::Serialize;
use sha2::{Digest, Sha256};

use gz_core::geometry::Polygon;

use crate::canonical_json::canonical_bytes;
use crate::StoreResult;

/// Lowercase hex SHA-256 of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Lowercase hex SHA-256 of a value's canonical JSON bytes.
pub fn sha256_canonical<T: Serialize>(value: &T) -> StoreResult<String> {
    Ok(sha256_hex(&canonical_bytes(value)?))
}

/// Evidence digest of an allocation geometry.
pub fn polygon_digest(polygon: &Polygon) -> StoreResult<String> {
    sha256_canonical(polygon)
}

// === Tests ===
