//! Cryptographic utility functions

use sha2::{Digest, Sha256};

/// Calculate SHA256 hash and return as hex string
pub fn sha256_hex(data: &str) -> String {
    sha256_hex_bytes(data.as_bytes())
}

/// Calculate SHA256 hash of raw bytes and return as hex string
pub fn sha256_hex_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
