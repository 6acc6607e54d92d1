use crate::error::Result;
use crate::middleware::SessionToken;
use crate::models::UserProfile;
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub async fn signup(
    state: web::Data<AppState>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let user = state.accounts.signup(&req.email, &req.password).await?;
    Ok(HttpResponse::Created().json(UserProfile::from(user)))
}

pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let token = state.accounts.login(&req.email, &req.password).await?;
    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}

/// Blacklist the presented token. The session middleware has already
/// verified it; from here on the revocation store is decisive.
pub async fn logout(state: web::Data<AppState>, token: SessionToken) -> Result<HttpResponse> {
    state.accounts.logout(&token.0).await?;
    Ok(HttpResponse::NoContent().finish())
}
