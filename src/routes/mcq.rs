use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::dto::envelope::Envelope;
use crate::dto::stage_dto::{parse_attempt_id, McqSubmitRequest, McqSubmitResponse, StartResponse};
use crate::error::Result;
use crate::models::identity::AuthContext;
use crate::services::mcq_stage::McqView;
use crate::utils::validation::validate;
use crate::AppState;

#[axum::debug_handler]
pub async fn start(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Envelope<StartResponse<McqView>>>> {
    let started = state.mcq().start(&ctx).await?;
    Ok(Envelope::ok(started.into()))
}

#[axum::debug_handler]
pub async fn submit(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: std::result::Result<Json<McqSubmitRequest>, JsonRejection>,
) -> Result<Json<Envelope<McqSubmitResponse>>> {
    let Json(req) = payload?;
    validate(&req)?;
    let attempt_id = parse_attempt_id(&req.attempt_id)?;

    let done = state.mcq().submit(&ctx, attempt_id, req.answers).await?;
    Ok(Envelope::ok(done.into()))
}
