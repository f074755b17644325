//! Content hashing for cache validity
//!
//! A file's cached rows are valid exactly as long as the SHA-256 digest of
//! its text is unchanged. No mtime or size check is involved.

use sha2::{Digest, Sha256};

/// SHA-256 of `content` as lowercase hex
pub fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The first `max_chars` characters of `content`, cut on a char boundary
pub fn truncate_chars(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((offset, _)) => &content[..offset],
        None => content,
    }
}
