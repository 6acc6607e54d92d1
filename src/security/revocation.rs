//! Token revocation (blacklist). Converts the otherwise-stateless token
//! scheme into one supporting immediate invalidation: a revoked entry lives
//! for the full session TTL, after which the token is expired anyway and
//! the entry self-destructs. No sweeper needed; growth is bounded by the
//! number of recently revoked tokens.

use crate::error::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Mutex;

#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Mark a token as revoked for at least its remaining lifetime.
    /// Idempotent.
    async fn revoke(&self, token: &str) -> Result<()>;

    /// Existence check; absence means "not revoked". Errors propagate so
    /// callers can fail closed.
    async fn is_revoked(&self, token: &str) -> Result<bool>;
}

const REVOKED_KEY_PREFIX: &str = "accounts:revoked:token:";

/// Hash the token before it becomes a Redis key, so a dump of the store
/// cannot leak live credentials.
fn revocation_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{REVOKED_KEY_PREFIX}{}", hex::encode(hasher.finalize()))
}

/// Redis-backed store used in production.
pub struct RedisRevocationStore {
    redis: ConnectionManager,
    ttl_secs: u64,
}

impl RedisRevocationStore {
    /// `ttl_secs` must cover the configured session lifetime; the exact
    /// remaining lifetime of each token is not tracked.
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token: &str) -> Result<()> {
        let key = revocation_key(token);
        let mut conn = self.redis.clone();

        redis::cmd("SET")
            .arg(&key)
            .arg("1")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;

        tracing::info!(ttl_secs = self.ttl_secs, "token revoked");
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool> {
        let key = revocation_key(token);
        let mut conn = self.redis.clone();

        let exists: bool = redis::cmd("EXISTS")
            .arg(&key)
            .query_async(&mut conn)
            .await?;

        Ok(exists)
    }
}

/// In-memory store for tests and single-process development. Entries never
/// expire; acceptable for short-lived processes.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    revoked: Mutex<HashSet<String>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, token: &str) -> Result<()> {
        self.revoked
            .lock()
            .expect("revocation set poisoned")
            .insert(revocation_key(token));
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool> {
        Ok(self
            .revoked
            .lock()
            .expect("revocation set poisoned")
            .contains(&revocation_key(token)))
    }
}
