use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::{Error, Result};
use crate::models::candidate::Role;
use crate::models::identity::AuthContext;
use crate::utils::token::decode_token;
use crate::AppState;

/// Decodes `Authorization: Bearer <jwt>` into an [`AuthContext`] request
/// extension.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(Error::MissingToken)?;
    let raw = header.to_str().map_err(|_| Error::InvalidToken)?;
    let token = raw
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(Error::MissingToken)?;

    let ctx = decode_token(&state.config.jwt_secret, token)
        .and_then(|claims| claims.into_context())
        .map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            e
        })?;

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// Must run after [`require_bearer_auth`].
pub async fn require_candidate(req: Request, next: Next) -> Result<Response> {
    let ctx = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(Error::MissingToken)?;
    if ctx.role != Role::Candidate {
        tracing::warn!(candidate_id = %ctx.candidate_id, role = ctx.role.as_str(), "non-candidate on stage route");
        return Err(Error::Forbidden);
    }
    Ok(next.run(req).await)
}
