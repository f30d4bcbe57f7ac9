use sha2::{Digest, Sha256};

/// SHA-256 over the UTF-8 bytes of `password`, lowercase hex.
pub fn hash(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        hex.push_str(&format!("{:02x}", b));
    }
    hex
}

pub fn verify(password: &str, digest: &str) -> bool {
    if digest.is_empty() {
        return false;
    }
    same_bytes(hash(password).as_bytes(), digest.as_bytes())
}

/// Plaintext comparison for records written before passwords were hashed.
pub fn verify_legacy(password: &str, stored: &str) -> bool {
    same_bytes(password.as_bytes(), stored.as_bytes())
}

// does not stop at the first differing byte
fn same_bytes(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
