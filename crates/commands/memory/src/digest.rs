use sha2::{Digest, Sha256};

/// Hex digest of a stored value: the first 8 bytes of its SHA-256 hash,
/// rendered as 16 lowercase hex characters.
pub fn value_digest(value: &[u8]) -> String {
    let hash = Sha256::digest(value);
    hex::encode(&hash[..8])
}

/// Compare a caller-supplied digest against a computed one, ignoring ASCII
/// case.
pub(crate) fn digest_matches(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}
