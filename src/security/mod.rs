//! Security primitives: session token codec, Argon2id password hashing,
//! and the revocation blacklist.

pub mod password;
pub mod revocation;
pub mod token;

pub use password::{hash_password, verify_password};
pub use revocation::{InMemoryRevocationStore, RedisRevocationStore, RevocationStore};
pub use token::{TokenCodec, TokenError};

use crate::error::{AppError, Result};

/// Identity claim extracted from a verified session token. Request-scoped;
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: i64,
    pub role: String,
}

impl Identity {
    /// Role gate for role-restricted operations. A mismatch is `Forbidden`,
    /// deliberately distinct from the authentication failures that produce
    /// `Unauthorized`.
    pub fn require_role(&self, role: &str) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}
