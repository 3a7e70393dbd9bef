pub mod coding;
pub mod health;
pub mod mcq;
pub mod resume;
pub mod upload;
pub mod user;
pub mod video;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};

use crate::middleware::{
    auth::{require_bearer_auth, require_candidate},
    rate_limit::auth_rate_limit,
};
use crate::AppState;

/// Largest accepted request body: the video ceiling plus multipart framing.
pub const MAX_BODY_BYTES: usize = video::MAX_VIDEO_BYTES + 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let user_api = Router::new()
        .route("/api/user/me", get(user::me))
        .route("/api/user/profile", post(user::save_profile))
        .route("/api/user/info_resume", post(resume::upload_resume))
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth))
        .route("/api/user/login", post(user::login))
        .layer(from_fn_with_state(state.clone(), auth_rate_limit));

    let stage_api = Router::new()
        .route("/api/mcq/start", get(mcq::start))
        .route("/api/mcq/submit", post(mcq::submit))
        .route("/api/video/start", get(video::start))
        .route("/api/video/upload", post(video::upload))
        .route("/api/video/transcribe", post(video::transcribe))
        .route("/api/video/submit", post(video::submit))
        .route("/api/coding/start", get(coding::start))
        .route("/api/coding/submit", post(coding::submit))
        .route_layer(from_fn(require_candidate))
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .merge(user_api)
        .merge(stage_api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
