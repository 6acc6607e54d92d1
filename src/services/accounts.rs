//! Account business logic: signup, login, logout, and profile operations.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{self, RevocationStore, TokenCodec};
use std::sync::Arc;

const DEFAULT_ROLE: &str = "user";

pub struct AccountService {
    users: Arc<dyn UserStore>,
    codec: Arc<TokenCodec>,
    revocations: Arc<dyn RevocationStore>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        codec: Arc<TokenCodec>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        Self {
            users,
            codec,
            revocations,
        }
    }

    /// Register a new account. Only the Argon2id hash of the password is
    /// stored.
    ///
    /// The existence check below races with concurrent signups for the same
    /// email; the unique constraint on `users.email` is the source of truth
    /// and the store reports its violation as the same duplicate-email
    /// rejection.
    pub async fn signup(&self, email: &str, password: &str) -> Result<User> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = security::hash_password(password)?;
        let user = self.users.create(email, &password_hash, DEFAULT_ROLE).await?;

        tracing::info!(user_id = user.id, "account created");
        Ok(user)
    }

    /// Authenticate by email and password and issue a session token.
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !security::verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.codec.issue(user.id, &user.role)?;
        tracing::info!(user_id = user.id, "session issued");
        Ok(token)
    }

    /// Invalidate a session immediately by blacklisting its token.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.revocations.revoke(token).await
    }

    pub async fn profile(&self, user_id: i64) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn update_name(&self, user_id: i64, name: &str) -> Result<User> {
        self.users
            .update_name(user_id, name)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        if self.users.delete(user_id).await? {
            tracing::info!(user_id, "account deleted");
            Ok(())
        } else {
            Err(AppError::NotFound("user"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::security::InMemoryRevocationStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// In-memory [`UserStore`] enforcing the same email uniqueness as the
    /// database constraint.
    #[derive(Default)]
    struct InMemoryUserStore {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserStore for InMemoryUserStore {
        async fn create(&self, email: &str, password_hash: &str, role: &str) -> Result<User> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == email) {
                return Err(AppError::DuplicateEmail);
            }
            let now = Utc::now();
            let user = User {
                id: users.len() as i64 + 1,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                role: role.to_string(),
                name: String::new(),
                created_at: now,
                updated_at: now,
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.id == user_id).cloned())
        }

        async fn update_name(&self, user_id: i64, name: &str) -> Result<Option<User>> {
            let mut users = self.users.lock().unwrap();
            match users.iter_mut().find(|u| u.id == user_id) {
                Some(user) => {
                    user.name = name.to_string();
                    user.updated_at = Utc::now();
                    Ok(Some(user.clone()))
                }
                None => Ok(None),
            }
        }

        async fn delete(&self, user_id: i64) -> Result<bool> {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|u| u.id != user_id);
            Ok(users.len() < before)
        }
    }

    struct Fixture {
        codec: Arc<TokenCodec>,
        revocations: Arc<InMemoryRevocationStore>,
        service: AccountService,
    }

    fn fixture() -> Fixture {
        let codec = Arc::new(TokenCodec::new(&AuthConfig {
            secret: "test-secret".to_string(),
            session_ttl_secs: 60,
        }));
        let revocations = Arc::new(InMemoryRevocationStore::new());
        let service = AccountService::new(
            Arc::new(InMemoryUserStore::default()),
            codec.clone(),
            revocations.clone(),
        );
        Fixture {
            codec,
            revocations,
            service,
        }
    }

    #[tokio::test]
    async fn signup_stores_hash_not_password() {
        let f = fixture();
        let user = f.service.signup("a@example.com", "hunter2-hunter2").await.unwrap();

        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.role, "user");
        assert_ne!(user.password_hash, "hunter2-hunter2");
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email() {
        let f = fixture();
        f.service.signup("a@example.com", "hunter2-hunter2").await.unwrap();

        assert!(matches!(
            f.service.signup("a@example.com", "different-password").await,
            Err(AppError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let f = fixture();
        let user = f.service.signup("a@example.com", "hunter2-hunter2").await.unwrap();

        let token = f.service.login("a@example.com", "hunter2-hunter2").await.unwrap();
        let identity = f.codec.verify(&token).unwrap();
        assert_eq!(identity.subject_id, user.id);
        assert_eq!(identity.role, "user");
    }

    #[tokio::test]
    async fn login_failure_is_uniform_across_causes() {
        let f = fixture();
        f.service.signup("a@example.com", "hunter2-hunter2").await.unwrap();

        // Unknown email and wrong password must be indistinguishable.
        let unknown = f.service.login("b@example.com", "hunter2-hunter2").await;
        let wrong = f.service.login("a@example.com", "not-the-password").await;

        let unknown = unknown.unwrap_err();
        let wrong = wrong.unwrap_err();
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn logout_revokes_the_presented_token() {
        let f = fixture();
        f.service.signup("a@example.com", "hunter2-hunter2").await.unwrap();
        let token = f.service.login("a@example.com", "hunter2-hunter2").await.unwrap();

        f.service.logout(&token).await.unwrap();
        assert!(f.revocations.is_revoked(&token).await.unwrap());
    }

    #[tokio::test]
    async fn delete_missing_user_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.service.delete_user(42).await,
            Err(AppError::NotFound(_))
        ));
    }
}
