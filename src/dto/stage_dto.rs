use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::candidate::Step;
use crate::models::coding::{CaseResult, CodingOutcome};
use crate::models::mcq::McqOutcome;
use crate::models::resume::ParsedResume;
use crate::models::video::{Transcription, VideoOutcome, VideoSubmission};
use crate::services::attempt_service::{CompletedAttempt, StartedAttempt};

/// Accepts any string so that unknown ids surface as a missing attempt
/// rather than a malformed body.
pub fn parse_attempt_id(raw: &str) -> Result<Uuid> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Validation("attemptId is required".to_string()));
    }
    Uuid::parse_str(raw).map_err(|_| Error::AttemptNotFound)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse<V> {
    pub attempt_id: Uuid,
    pub resumed: bool,
    #[serde(flatten)]
    pub view: V,
}

impl<V> From<StartedAttempt<V>> for StartResponse<V> {
    fn from(started: StartedAttempt<V>) -> Self {
        Self {
            attempt_id: started.attempt_id,
            resumed: started.resumed,
            view: started.view,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct McqSubmitRequest {
    #[serde(default)]
    pub attempt_id: String,
    #[validate(length(min = 1, message = "answers must not be empty"))]
    pub answers: Vec<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McqSubmitResponse {
    pub attempt_id: Uuid,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub current_step: Step,
}

impl From<CompletedAttempt<McqOutcome>> for McqSubmitResponse {
    fn from(done: CompletedAttempt<McqOutcome>) -> Self {
        Self {
            attempt_id: done.attempt_id,
            score: done.outcome.score,
            total: done.outcome.total,
            percentage: done.outcome.percentage,
            current_step: done.current_step,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedVideo {
    pub video_url: String,
    pub audio_url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "audioUrl is required"))]
    pub audio_url: String,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcription: Transcription,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VideoSubmitRequest {
    #[serde(default)]
    pub attempt_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "videoUrl is required"))]
    pub video_url: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "audioUrl is required"))]
    pub audio_url: String,
}

impl VideoSubmitRequest {
    pub fn into_parts(self) -> Result<(Uuid, VideoSubmission)> {
        let attempt_id = parse_attempt_id(&self.attempt_id)?;
        Ok((
            attempt_id,
            VideoSubmission {
                video_url: self.video_url,
                audio_url: self.audio_url,
            },
        ))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSubmitResponse {
    pub attempt_id: Uuid,
    pub score: i32,
    pub feedback: String,
    pub relevance: i32,
    pub clarity: i32,
    pub confidence: i32,
    pub transcript: String,
    pub current_step: Step,
}

impl From<CompletedAttempt<VideoOutcome>> for VideoSubmitResponse {
    fn from(done: CompletedAttempt<VideoOutcome>) -> Self {
        let o = done.outcome;
        Self {
            attempt_id: done.attempt_id,
            score: o.score,
            feedback: o.feedback,
            relevance: o.relevance,
            clarity: o.clarity,
            confidence: o.confidence,
            transcript: o.transcript,
            current_step: done.current_step,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CodingSubmitRequest {
    #[serde(default)]
    pub attempt_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "solution is required"))]
    pub solution: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodingSubmitResponse {
    pub attempt_id: Uuid,
    pub score: i32,
    pub feedback: String,
    pub passed: u32,
    pub total: u32,
    /// Results for visible test cases only.
    pub results: Vec<CaseResult>,
    pub current_step: Step,
}

impl From<CompletedAttempt<CodingOutcome>> for CodingSubmitResponse {
    fn from(done: CompletedAttempt<CodingOutcome>) -> Self {
        let o = done.outcome;
        Self {
            attempt_id: done.attempt_id,
            score: o.score,
            feedback: o.feedback,
            passed: o.passed,
            total: o.total,
            results: o.results.into_iter().filter(|r| !r.hidden).collect(),
            current_step: done.current_step,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedResume {
    #[serde(flatten)]
    pub parsed: ParsedResume,
    pub resume_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeResponse {
    pub parsed_data: ReviewedResume,
    pub raw_text: String,
}
