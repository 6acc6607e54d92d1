//! Signed session tokens. Single shared HMAC secret, fixed TTL, claims
//! limited to subject id, role and the time bounds.
//!
//! Verification pins HS256: a token whose header names any other algorithm
//! is rejected regardless of its signature, so an attacker cannot downgrade
//! or confuse the verifier by editing the header.

use crate::config::AuthConfig;
use crate::security::Identity;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is expired")]
    Expired,

    /// Signing-primitive failure. Not expected in normal operation.
    #[error("token encoding failed: {0}")]
    Encoding(jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    role: String,
    iat: i64,
    exp: i64,
}

/// Encodes and verifies session tokens. Pure with respect to a supplied
/// clock; no I/O.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(auth.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(auth.secret.as_bytes()),
            ttl: Duration::seconds(auth.session_ttl_secs as i64),
        }
    }

    pub fn issue(&self, subject_id: i64, role: &str) -> Result<String, TokenError> {
        self.issue_at(subject_id, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject_id: i64,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Checks signature integrity, then expiry against `now`. Expiry is
    /// evaluated here rather than by the JWT library so the clock stays
    /// injectable.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        if data.claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(Identity {
            subject_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}
