//! Content hashing using BLAKE3

use blake3::Hasher;

/// BLAKE3 digest of a file's bytes; the modification marker of a file entry.
pub type ContentHash = [u8; 32];

/// Compute content hash for file bytes
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}

/// Short hex form for human-readable output.
pub fn short_hex(hash: &ContentHash) -> String {
    hex::encode(&hash[..6])
}
