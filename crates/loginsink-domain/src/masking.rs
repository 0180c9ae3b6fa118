use sha2::{Digest, Sha256};

/// One-way mask for a sensitive field value.
///
/// SHA-256 over the UTF-8 bytes, lowercase hex. Deterministic, so masked
/// columns still support equality joins downstream. Total over any string,
/// including the empty string.
pub fn mask(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}
