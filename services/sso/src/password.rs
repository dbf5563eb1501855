//! Password hashing.
//!
//! Uses native async traits (Rust 2024 edition). The bcrypt work runs on the
//! blocking pool; at production cost factors a single hash takes long
//! enough to stall an async worker.

use std::future::Future;
use thiserror::Error;

/// Lowest work factor bcrypt accepts.
pub const MIN_COST: u32 = 4;
/// Highest work factor bcrypt accepts.
pub const MAX_COST: u32 = 31;
/// Work factor used when none is configured.
pub const DEFAULT_COST: u32 = 10;

/// Hashing failed for a reason unrelated to the password itself.
#[derive(Error, Debug)]
pub enum HashError {
    /// The hashing primitive failed
    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    /// The blocking task running the hash panicked or was aborted
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One-way password hashing with constant-time verification.
pub trait PasswordHasher: Send + Sync {
    /// Hash `plaintext` with a fresh random salt.
    fn hash(&self, plaintext: &str) -> impl Future<Output = Result<Vec<u8>, HashError>> + Send;

    /// Check `plaintext` against a stored hash.
    ///
    /// Any mismatch, including a malformed stored hash, is `false`.
    fn verify(&self, hash: &[u8], plaintext: &str) -> impl Future<Output = bool> + Send;
}

/// bcrypt-backed hasher with a fixed cost factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Create a hasher with the given work factor.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `cost` is outside bcrypt's range.
    pub fn new(cost: u32) -> Result<Self, crate::AuthError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(crate::AuthError::config(format!(
                "bcrypt cost must be between {MIN_COST} and {MAX_COST}, got {cost}"
            )));
        }
        Ok(Self { cost })
    }

    /// Configured work factor.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher for BcryptHasher {
    async fn hash(&self, plaintext: &str) -> Result<Vec<u8>, HashError> {
        let cost = self.cost;
        let plaintext = plaintext.to_owned();
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost)).await??;
        Ok(hashed.into_bytes())
    }

    async fn verify(&self, hash: &[u8], plaintext: &str) -> bool {
        let Ok(hash) = std::str::from_utf8(hash).map(str::to_owned) else {
            return false;
        };
        let plaintext = plaintext.to_owned();

        // bcrypt compares digests in constant time.
        tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hash))
            .await
            .is_ok_and(|res| res.unwrap_or(false))
    }
}
