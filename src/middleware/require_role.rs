//! Role gate for role-restricted scopes. Runs after session authentication
//! and answers 403 on a role mismatch; authentication failures stay 401.

use crate::error::AppError;
use crate::security::Identity;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

pub struct RequireRole {
    role: &'static str,
}

impl RequireRole {
    pub fn new(role: &'static str) -> Self {
        Self { role }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequireRoleService {
            service: Rc::new(service),
            role: self.role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: Rc<S>,
    role: &'static str,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
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
        let role = self.role;

        Box::pin(async move {
            let identity = req.extensions().get::<Identity>().cloned();

            match identity {
                // Reached without the session middleware in front.
                None => Err(AppError::Unauthorized.into()),
                Some(identity) => {
                    if let Err(e) = identity.require_role(role) {
                        tracing::debug!(
                            subject_id = identity.subject_id,
                            have = %identity.role,
                            want = role,
                            "role gate rejected request"
                        );
                        return Err(e.into());
                    }
                    service.call(req).await
                }
            }
        })
    }
}
