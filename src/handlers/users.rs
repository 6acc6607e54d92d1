use crate::error::Result;
use crate::models::UserProfile;
use crate::security::Identity;
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

pub async fn profile(state: web::Data<AppState>, identity: Identity) -> Result<HttpResponse> {
    let user = state.accounts.profile(identity.subject_id).await?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    identity: Identity,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let user = state
        .accounts
        .update_name(identity.subject_id, &req.name)
        .await?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}

/// Admin-only; the `/user` scope is behind the role gate.
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    state.accounts.delete_user(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
