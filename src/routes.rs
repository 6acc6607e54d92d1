//! Route configuration. Public endpoints first, then the session-guarded
//! scope, with the admin scope nested behind the role gate.

use crate::handlers;
use crate::middleware::{RequireRole, SessionAuthMiddleware, SessionAuthenticator};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, authenticator: Arc<SessionAuthenticator>) {
    cfg
        // Public
        .route("/health", web::get().to(handlers::health_check))
        .route("/signup", web::post().to(handlers::signup))
        .route("/login", web::post().to(handlers::login))
        // Protected
        .service(
            web::scope("")
                .wrap(SessionAuthMiddleware::new(authenticator))
                .route("/logout", web::post().to(handlers::logout))
                .route("/profile", web::get().to(handlers::profile))
                .route("/profile", web::put().to(handlers::update_profile))
                // Admin-only
                .service(
                    web::scope("/user")
                        .wrap(RequireRole::new("admin"))
                        .route("/{id}", web::delete().to(handlers::delete_user)),
                ),
        );
}
