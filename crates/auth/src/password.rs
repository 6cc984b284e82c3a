//! One-way adaptive password hashing (bcrypt).

use thiserror::Error;
use tracing::warn;

use emoney_core::ServiceError;

/// Cost 10 lands around 100ms per hash on commodity hardware.
pub const DEFAULT_COST: u32 = 10;

const MIN_PASSWORD_LEN: usize = 8;
/// bcrypt ignores everything past 72 bytes; refuse rather than truncate silently.
const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt cost {0} is outside 4..=31")]
    InvalidCost(u32),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::infrastructure("password hashing", err)
    }
}

/// Input rule for new passwords.
pub fn validate_password(plaintext: &str) -> Result<(), ServiceError> {
    if plaintext.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if plaintext.len() > MAX_PASSWORD_BYTES {
        return Err(ServiceError::validation(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(4..=31).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash on the calling thread. Prefer [`PasswordHasher::hash_blocking`] from async code.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// A mismatch is `false`, not an error. A stored hash bcrypt cannot parse
    /// also yields `false` (and a warning), so a corrupt row can never log anyone in.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match bcrypt::verify(plaintext, hash) {
            Ok(matched) => matched,
            Err(e) => {
                warn!(error = %e, "stored password hash could not be verified");
                false
            }
        }
    }

    /// Hash on the blocking pool so request workers are not stalled.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, PasswordError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| PasswordError::Hashing(format!("hashing task failed: {e}")))?
    }

    pub async fn verify_blocking(&self, plaintext: String, hash: String) -> bool {
        let hasher = *self;
        match tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash)).await {
            Ok(matched) => matched,
            Err(e) => {
                warn!(error = %e, "password verification task failed");
                false
            }
        }
    }
}
