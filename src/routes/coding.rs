use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::dto::envelope::Envelope;
use crate::dto::stage_dto::{
    parse_attempt_id, CodingSubmitRequest, CodingSubmitResponse, StartResponse,
};
use crate::error::Result;
use crate::models::identity::AuthContext;
use crate::services::coding_stage::CodingView;
use crate::utils::validation::validate;
use crate::AppState;

#[axum::debug_handler]
pub async fn start(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Envelope<StartResponse<CodingView>>>> {
    let started = state.coding().start(&ctx).await?;
    Ok(Envelope::ok(started.into()))
}

#[axum::debug_handler]
pub async fn submit(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: std::result::Result<Json<CodingSubmitRequest>, JsonRejection>,
) -> Result<Json<Envelope<CodingSubmitResponse>>> {
    let Json(req) = payload?;
    validate(&req)?;
    let attempt_id = parse_attempt_id(&req.attempt_id)?;

    let done = state.coding().submit(&ctx, attempt_id, req.solution).await?;
    Ok(Envelope::ok(done.into()))
}
