//! ID generation and validation.

use ulid::Ulid;

use crate::{AppError, AppResult};

/// Characters of the lowercase Crockford base32 alphabet used by ULIDs.
const ALPHABET: &str = "0123456789abcdefghjkmnpqrstvwxyz";

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable by creation time, which keeps
    /// primary-key order close to insertion order.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }
}

/// Whether `id` is a well-formed identifier as produced by [`IdGenerator`].
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 26
        // the first symbol only carries 3 bits
        && id.starts_with(|c: char| ('0'..='7').contains(&c))
        && id.chars().all(|c| ALPHABET.contains(c))
}

/// Reject a malformed identifier before it reaches the store.
///
/// `label` names the resource in the error message, e.g. `"listing"`.
pub fn ensure_valid_id(id: &str, label: &str) -> AppResult<()> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid {label} id")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_ne!(id1, id2);
        assert!(is_valid_id(&id1));
        assert!(is_valid_id(&id2));
    }

    #[test]
    fn test_rejects_malformed_ids() {
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("not-an-id"));
        // uppercase is never produced
        assert!(!is_valid_id("01HQZX3Y4N5P6Q7R8S9T0V1W2X"));
        // `u` is excluded from the alphabet
        assert!(!is_valid_id("01hqzx3y4n5p6q7r8s9t0v1wux"));
        // overflow: first symbol above 7
        assert!(!is_valid_id("81hqzx3y4n5p6q7r8s9t0v1w2x"));
        assert!(is_valid_id("01hqzx3y4n5p6q7r8s9t0v1w2x"));
    }

    #[test]
    fn test_ensure_valid_id_message() {
        let err = ensure_valid_id("abc", "listing").unwrap_err();
        assert_eq!(err.to_string(), "Invalid listing id");
        assert!(ensure_valid_id(&IdGenerator::new().generate(), "listing").is_ok());
    }
}
