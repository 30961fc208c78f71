//! Password Hashing
//! Mission: Keep hashing behind a seam so the service owns all hash handling

use anyhow::{bail, Context, Result};
use bcrypt::DEFAULT_COST;

/// bcrypt ignores everything past this many input bytes.
const BCRYPT_MAX_PASSWORD_BYTES: usize = 72;

/// One-way hash + compare. Cost and parameters are the implementation's
/// concern; callers only see opaque hash strings.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String>;
    fn verify(&self, hash: &str, plaintext: &str) -> Result<bool>;
}

/// Production bcrypt hasher.
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new() -> Self {
        Self { cost: DEFAULT_COST }
    }

    /// Custom work factor. Tests use bcrypt's minimum cost to stay fast.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        // bcrypt silently truncates past 72 bytes; reject instead.
        if plaintext.len() > BCRYPT_MAX_PASSWORD_BYTES {
            bail!(
                "password length {} exceeds bcrypt's {}-byte limit",
                plaintext.len(),
                BCRYPT_MAX_PASSWORD_BYTES
            );
        }
        bcrypt::hash(plaintext, self.cost).context("Failed to hash password")
    }

    fn verify(&self, hash: &str, plaintext: &str) -> Result<bool> {
        if plaintext.len() > BCRYPT_MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        bcrypt::verify(plaintext, hash).context("Failed to verify password")
    }
}
