//! SHA-256 content digests for emitted and consumed record streams.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::domain::Result;

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Lowercase hex SHA-256 of a file's contents.
pub fn file_digest(path: &Path) -> Result<String> {
    let content = std::fs::read(path)?;
    Ok(sha256_hex(&content))
}
