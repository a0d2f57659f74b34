//! Content hashing for cache keys.

use sha2::{Digest, Sha256};

/// SHA-256 of a model version id, as 64 lowercase hex characters.
pub fn version_hash(version_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(version_id.as_bytes());
    format!("{:x}", hasher.finalize())
}
