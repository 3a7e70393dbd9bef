use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoPayload {
    pub question: String,
}

#[derive(Debug, Clone)]
pub struct VideoSubmission {
    pub video_url: String,
    pub audio_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub text: String,
    pub language: String,
    pub confidence: f32,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerAssessment {
    pub score: i32,
    pub feedback: String,
    pub relevance: i32,
    pub clarity: i32,
    pub confidence: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOutcome {
    pub video_url: String,
    pub audio_url: String,
    pub transcript: String,
    pub score: i32,
    pub feedback: String,
    pub relevance: i32,
    pub clarity: i32,
    pub confidence: i32,
}
