//! Email verification codes.
//!
//! Only the SHA-256 digest of a code is stored; the plain code exists in the
//! outgoing mail alone.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a random 6-digit code.
#[must_use]
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Hex SHA-256 of a code.
#[must_use]
pub fn digest_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.trim().as_bytes()))
}

/// Whether `code` matches a stored digest.
#[must_use]
pub fn code_matches(code: &str, digest: &str) -> bool {
    !digest.is_empty() && digest_code(code) == digest
}
