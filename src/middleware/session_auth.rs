//! Session authentication: bearer extraction, token verification, and the
//! revocation check, collapsed into one per-request decision.
//!
//! Every failure on this path is answered with the same 401 body. Which
//! check failed (missing header, bad signature, expiry, revocation, store
//! error) is logged for diagnostics but never distinguishable by the
//! caller, so the endpoint cannot be used as an oracle to tell a forged
//! token from an expired one.

use crate::error::AppError;
use crate::security::{Identity, RevocationStore, TokenCodec};
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Raw bearer token for the current request, kept alongside [`Identity`] so
/// logout can revoke the exact credential it was called with.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Composes the token codec and the revocation store into a single
/// accept/reject decision.
pub struct SessionAuthenticator {
    codec: Arc<TokenCodec>,
    revocations: Arc<dyn RevocationStore>,
}

impl SessionAuthenticator {
    pub fn new(codec: Arc<TokenCodec>, revocations: Arc<dyn RevocationStore>) -> Self {
        Self { codec, revocations }
    }

    /// Decide a request's authentication from its authorization header
    /// value. `None` means the header was absent.
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<Identity, AppError> {
        let header = match credential {
            Some(h) => h,
            None => {
                tracing::debug!("authentication rejected: missing credential");
                return Err(AppError::Unauthorized);
            }
        };

        let token = match header.strip_prefix(BEARER_PREFIX) {
            Some(t) => t,
            None => {
                tracing::debug!("authentication rejected: unexpected scheme");
                return Err(AppError::Unauthorized);
            }
        };

        let identity = match self.codec.verify(token) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(reason = %e, "authentication rejected: token verification failed");
                return Err(AppError::Unauthorized);
            }
        };

        // Fail closed: a revocation-store error must not grant access.
        match self.revocations.is_revoked(token).await {
            Ok(false) => Ok(identity),
            Ok(true) => {
                tracing::warn!(subject_id = identity.subject_id, "attempt to use revoked token");
                Err(AppError::Unauthorized)
            }
            Err(e) => {
                tracing::error!(error = %e, "revocation check failed, rejecting request");
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Middleware factory guarding a scope with [`SessionAuthenticator`].
/// On success the request's extensions carry [`Identity`] and
/// [`SessionToken`] for handlers and the role gate.
pub struct SessionAuthMiddleware {
    authenticator: Arc<SessionAuthenticator>,
}

impl SessionAuthMiddleware {
    pub fn new(authenticator: Arc<SessionAuthenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(SessionAuthMiddlewareService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
        }))
    }
}

pub struct SessionAuthMiddlewareService<S> {
    service: Rc<S>,
    authenticator: Arc<SessionAuthenticator>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let authenticator = self.authenticator.clone();

        Box::pin(async move {
            // Copy the header out first; extensions_mut() below must not
            // overlap with an active header borrow.
            let credential = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string);

            let identity = authenticator.authenticate(credential.as_deref()).await?;

            let token = credential
                .as_deref()
                .and_then(|h| h.strip_prefix(BEARER_PREFIX))
                .unwrap_or_default()
                .to_string();

            req.extensions_mut().insert(identity);
            req.extensions_mut().insert(SessionToken(token));

            service.call(req).await
        })
    }
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Identity>().cloned() {
            Some(identity) => ready(Ok(identity)),
            None => ready(Err(AppError::Unauthorized.into())),
        }
    }
}

impl FromRequest for SessionToken {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<SessionToken>().cloned() {
            Some(token) => ready(Ok(token)),
            None => ready(Err(AppError::Unauthorized.into())),
        }
    }
}
