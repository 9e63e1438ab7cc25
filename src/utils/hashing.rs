//! Hashing utilities

use sha2::{Digest, Sha256};

/// Short hex digest of a byte buffer, stable across runs
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        let a = content_hash(b"cover");
        assert_eq!(a.len(), 16);
        assert_eq!(a, content_hash(b"cover"));
        assert_ne!(a, content_hash(b"other"));
    }
}
