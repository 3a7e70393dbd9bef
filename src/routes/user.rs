use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::dto::auth_dto::{LoginRequest, LoginResponse, ProfileResponse, UserSummary};
use crate::dto::envelope::Envelope;
use crate::dto::profile_dto::SaveProfileRequest;
use crate::error::Result;
use crate::models::identity::AuthContext;
use crate::utils::validation::validate;
use crate::AppState;

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Envelope<LoginResponse>>> {
    let Json(req) = payload?;
    validate(&req)?;

    let result = state.candidates().login(&req.email, &req.password).await?;
    Ok(Envelope::ok(LoginResponse {
        token: result.token,
        user: UserSummary::from(&result.candidate),
    }))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Envelope<ProfileResponse>>> {
    let user = state.candidates().profile(&ctx).await?;
    Ok(Envelope::ok(ProfileResponse { user }))
}

#[axum::debug_handler]
pub async fn save_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: std::result::Result<Json<SaveProfileRequest>, JsonRejection>,
) -> Result<Json<Envelope<ProfileResponse>>> {
    let Json(req) = payload?;
    validate(&req)?;

    let user = state.candidates().save_profile(&ctx, req.into()).await?;
    Ok(Envelope::ok(ProfileResponse { user }))
}
