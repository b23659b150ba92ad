//! Small string helpers exposed to templates.

use sha2::{Digest, Sha256};

pub fn lower(input: &str) -> String {
    input.to_lowercase()
}

pub fn upper(input: &str) -> String {
    input.to_uppercase()
}

pub fn concat(first: &str, second: &str) -> String {
    format!("{first}{second}")
}

pub fn prefix(prefix: &str, original: &str) -> String {
    concat(prefix, original)
}

pub fn suffix(suffix: &str, original: &str) -> String {
    concat(original, suffix)
}

/// Keeps the first `length` characters. Shorter input comes back unchanged.
pub fn truncate(length: usize, input: &str) -> String {
    input.chars().take(length).collect()
}

/// Lowercase hex SHA-256 digest, used by templates for stable object ids.
pub fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}
