//! Password hashing.
//!
//! Digests are standard bcrypt strings (`$2b$<cost>$<salt><hash>`), so the
//! salt and cost travel with the digest and nothing else needs storing.

use bcrypt::{DEFAULT_COST, hash, verify};

/// Lowest cost bcrypt accepts. Only suitable for tests.
pub const MIN_COST: u32 = 4;

#[derive(Debug, thiserror::Error)]
#[error("failed to hash password: {0}")]
pub struct HashError(#[from] bcrypt::BcryptError);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        Ok(hash(password, self.cost)?)
    }

    /// Returns `false` on mismatch and on digests bcrypt cannot parse.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        verify(password, digest).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordHasher {
        PasswordHasher::new(MIN_COST)
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast();
        let digest = hasher.hash("s3cret-pass").unwrap();

        assert_ne!(digest, "s3cret-pass");
        assert!(hasher.verify("s3cret-pass", &digest));
        assert!(!hasher.verify("wrong-pass", &digest));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hasher = fast();
        let first = hasher.hash("repeat").unwrap();
        let second = hasher.hash("repeat").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("repeat", &first));
        assert!(hasher.verify("repeat", &second));
    }

    #[test]
    fn test_verify_malformed_digest_is_false() {
        let hasher = fast();
        assert!(!hasher.verify("anything", "not-a-bcrypt-digest"));
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn test_digest_embeds_cost() {
        let digest = fast().hash("cost-check").unwrap();
        assert!(digest.starts_with("$2b$04$"));
    }

    #[test]
    fn test_default_cost() {
        assert_eq!(PasswordHasher::default().cost(), DEFAULT_COST);
    }

    #[test]
    fn test_invalid_cost_is_an_error() {
        assert!(PasswordHasher::new(99).hash("x").is_err());
    }
}
