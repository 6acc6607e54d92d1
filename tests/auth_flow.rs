//! End-to-end authentication flow through the actix middleware stack:
//! token issuance, bearer extraction, revocation, expiry, and the
//! unauthorized/forbidden distinction. Uses the in-memory revocation store
//! so no external services are needed.

use actix_web::{http::StatusCode, test, web, App, HttpResponse};
use chrono::{Duration, Utc};
use std::sync::Arc;

use account_service::config::AuthConfig;
use account_service::middleware::{RequireRole, SessionAuthMiddleware, SessionAuthenticator};
use account_service::security::{Identity, InMemoryRevocationStore, TokenCodec};

const TEST_SECRET: &str = "integration-test-secret";
const TEST_TTL_SECS: u64 = 60;

fn auth_config() -> AuthConfig {
    AuthConfig {
        secret: TEST_SECRET.to_string(),
        session_ttl_secs: TEST_TTL_SECS,
    }
}

struct Harness {
    codec: Arc<TokenCodec>,
    revocations: Arc<InMemoryRevocationStore>,
    authenticator: Arc<SessionAuthenticator>,
}

fn harness() -> Harness {
    let codec = Arc::new(TokenCodec::new(&auth_config()));
    let revocations = Arc::new(InMemoryRevocationStore::new());
    let authenticator = Arc::new(SessionAuthenticator::new(
        codec.clone(),
        revocations.clone(),
    ));
    Harness {
        codec,
        revocations,
        authenticator,
    }
}

async fn whoami(identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "subject_id": identity.subject_id,
        "role": identity.role,
    }))
}

async fn admin_ping() -> HttpResponse {
    HttpResponse::Ok().finish()
}

macro_rules! test_app {
    ($harness:expr) => {
        test::init_service(
            App::new().service(
                web::scope("")
                    .wrap(SessionAuthMiddleware::new($harness.authenticator.clone()))
                    .route("/whoami", web::get().to(whoami))
                    .service(
                        web::scope("/admin")
                            .wrap(RequireRole::new("admin"))
                            .route("/ping", web::get().to(admin_ping)),
                    ),
            ),
        )
        .await
    };
}

#[actix_rt::test]
async fn missing_token_is_unauthorized() {
    let h = harness();
    let app = test_app!(h);

    let req = test::TestRequest::get().uri("/whoami").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn garbage_token_is_unauthorized() {
    let h = harness();
    let app = test_app!(h);

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn valid_token_reaches_handler_with_identity() {
    let h = harness();
    let app = test_app!(h);

    let token = h.codec.issue(7, "admin").unwrap();
    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();

    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["subject_id"], 7);
    assert_eq!(body["role"], "admin");
}

#[actix_rt::test]
async fn revoked_token_is_rejected_despite_valid_signature() {
    let h = harness();
    let app = test_app!(h);

    let token = h.codec.issue(7, "admin").unwrap();

    // Accepted before revocation.
    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    use account_service::security::RevocationStore;
    h.revocations.revoke(&token).await.unwrap();

    // The codec alone still accepts the token; the authenticator must not.
    assert!(h.codec.verify(&token).is_ok());
    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn expired_token_is_unauthorized() {
    let h = harness();
    let app = test_app!(h);

    let issued = Utc::now() - Duration::seconds(TEST_TTL_SECS as i64 + 60);
    let token = h.codec.issue_at(7, "admin", issued).unwrap();

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn token_signed_with_other_secret_is_unauthorized() {
    let h = harness();
    let app = test_app!(h);

    let foreign = TokenCodec::new(&AuthConfig {
        secret: "some-other-secret".to_string(),
        session_ttl_secs: TEST_TTL_SECS,
    });
    let token = foreign.issue(7, "admin").unwrap();

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn role_gate_separates_forbidden_from_unauthorized() {
    let h = harness();
    let app = test_app!(h);

    // Authenticated but not an admin: 403, not 401.
    let user_token = h.codec.issue(3, "user").unwrap();
    let req = test::TestRequest::get()
        .uri("/admin/ping")
        .insert_header(("Authorization", format!("Bearer {user_token}")))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    // Admin passes.
    let admin_token = h.codec.issue(1, "admin").unwrap();
    let req = test::TestRequest::get()
        .uri("/admin/ping")
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Unauthenticated stays 401 on the same route.
    let req = test::TestRequest::get().uri("/admin/ping").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}
