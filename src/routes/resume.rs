use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Extension, Json,
};

use crate::dto::envelope::Envelope;
use crate::dto::stage_dto::{ResumeResponse, ReviewedResume};
use crate::error::{Error, Result};
use crate::models::identity::AuthContext;
use crate::routes::upload::{object_name, read_file_field};
use crate::AppState;

pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;
const RAW_TEXT_PREVIEW_CHARS: usize = 500;

/// Parses an uploaded PDF resume for the candidate to review. Nothing is
/// saved to the profile here.
#[axum::debug_handler]
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Envelope<ResumeResponse>>> {
    let file = read_file_field(multipart, "resume", MAX_RESUME_BYTES).await?;
    if file.content_type != "application/pdf" || !file.data.starts_with(b"%PDF") {
        return Err(Error::Validation("Only PDF resumes are accepted".to_string()));
    }

    let adapters = &state.adapters;
    let name = object_name("resumes", ctx.candidate_id, "pdf");
    let resume_url = adapters
        .storage
        .upload(&name, "application/pdf", file.data.clone())
        .await?;
    tracing::info!(candidate_id = %ctx.candidate_id, object = %name, "resume stored");

    let text = adapters.media.pdf_to_text(file.data).await?;
    let parsed = adapters.resume_parser.parse(&text).await?;
    tracing::info!(
        candidate_id = %ctx.candidate_id,
        skills = parsed.skills.len(),
        "resume parsed"
    );

    Ok(Envelope::ok(ResumeResponse {
        parsed_data: ReviewedResume { parsed, resume_url },
        raw_text: preview(&text),
    }))
}

fn preview(text: &str) -> String {
    let mut head: String = text.chars().take(RAW_TEXT_PREVIEW_CHARS).collect();
    head.push_str("...");
    head
}
