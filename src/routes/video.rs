use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    Extension, Json,
};

use crate::dto::envelope::Envelope;
use crate::dto::stage_dto::{
    StartResponse, TranscribeRequest, TranscribeResponse, UploadedVideo, VideoSubmitRequest,
    VideoSubmitResponse,
};
use crate::error::{Error, Result};
use crate::models::identity::AuthContext;
use crate::models::video::VideoPayload;
use crate::routes::upload::{object_name, read_file_field};
use crate::utils::validation::validate;
use crate::AppState;

pub const MAX_VIDEO_BYTES: usize = 100 * 1024 * 1024;

#[axum::debug_handler]
pub async fn start(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Envelope<StartResponse<VideoPayload>>>> {
    let started = state.video().start(&ctx).await?;
    Ok(Envelope::ok(started.into()))
}

/// Stores the recording and its extracted MP3 track.
#[axum::debug_handler]
pub async fn upload(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Envelope<UploadedVideo>>> {
    let file = read_file_field(multipart, "video", MAX_VIDEO_BYTES).await?;
    if !file.content_type.starts_with("video/") {
        return Err(Error::Validation("Only video files are accepted".to_string()));
    }

    let adapters = &state.adapters;
    let video_name = object_name("videos", ctx.candidate_id, "webm");
    let video_url = adapters
        .storage
        .upload(&video_name, &file.content_type, file.data.clone())
        .await?;

    let audio = adapters.media.extract_audio(file.data).await?;
    let audio_name = object_name("audios", ctx.candidate_id, "mp3");
    let audio_url = adapters.storage.upload(&audio_name, "audio/mpeg", audio).await?;

    tracing::info!(
        candidate_id = %ctx.candidate_id,
        video = %video_name,
        audio = %audio_name,
        "video answer stored"
    );
    Ok(Envelope::ok(UploadedVideo {
        video_url,
        audio_url,
    }))
}

#[axum::debug_handler]
pub async fn transcribe(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: std::result::Result<Json<TranscribeRequest>, JsonRejection>,
) -> Result<Json<Envelope<TranscribeResponse>>> {
    let Json(req) = payload?;
    validate(&req)?;

    let transcription = state.adapters.transcriber.transcribe(&req.audio_url).await?;
    tracing::info!(
        candidate_id = %ctx.candidate_id,
        words = transcription.word_count,
        "audio transcribed"
    );
    Ok(Envelope::ok(TranscribeResponse { transcription }))
}

#[axum::debug_handler]
pub async fn submit(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: std::result::Result<Json<VideoSubmitRequest>, JsonRejection>,
) -> Result<Json<Envelope<VideoSubmitResponse>>> {
    let Json(req) = payload?;
    validate(&req)?;
    let (attempt_id, submission) = req.into_parts()?;

    let done = state.video().submit(&ctx, attempt_id, submission).await?;
    Ok(Envelope::ok(done.into()))
}
