//! Content hashing used for change detection.

use std::borrow::Cow;

use sha2::{Digest, Sha256};

/// SHA-256 of raw bytes, lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// CRLF → LF, so a checkout with Windows line endings does not look like a
/// change. Borrows when there is nothing to replace.
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains("\r\n") {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}
