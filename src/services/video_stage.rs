use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::attempt::StageKind;
use crate::models::candidate::Candidate;
use crate::models::video::{VideoOutcome, VideoPayload, VideoSubmission};
use crate::services::ai_service::{Assessor, QuestionGenerator};
use crate::services::speech_service::Transcriber;
use crate::services::stage::{Graded, Stage};

impl Graded for VideoOutcome {
    fn recorded_score(&self) -> i32 {
        self.score
    }

    fn recorded_feedback(&self) -> Option<String> {
        Some(self.feedback.clone())
    }
}

pub struct VideoStage {
    generator: Arc<dyn QuestionGenerator>,
    transcriber: Arc<dyn Transcriber>,
    assessor: Arc<dyn Assessor>,
}

impl VideoStage {
    pub fn new(
        generator: Arc<dyn QuestionGenerator>,
        transcriber: Arc<dyn Transcriber>,
        assessor: Arc<dyn Assessor>,
    ) -> Self {
        Self {
            generator,
            transcriber,
            assessor,
        }
    }
}

#[async_trait]
impl Stage for VideoStage {
    const KIND: StageKind = StageKind::Video;

    type Payload = VideoPayload;
    type View = VideoPayload;
    type Submission = VideoSubmission;
    type Outcome = VideoOutcome;

    async fn generate(&self, candidate: &Candidate) -> Result<VideoPayload> {
        let question = self.generator.generate_behavioral_question(candidate).await?;
        Ok(VideoPayload { question })
    }

    fn view(&self, payload: &VideoPayload) -> VideoPayload {
        payload.clone()
    }

    async fn score(&self, payload: &VideoPayload, submission: VideoSubmission) -> Result<VideoOutcome> {
        if submission.video_url.trim().is_empty() || submission.audio_url.trim().is_empty() {
            return Err(Error::Validation(
                "videoUrl and audioUrl are required".to_string(),
            ));
        }

        let transcription = self.transcriber.transcribe(&submission.audio_url).await?;
        let assessment = self
            .assessor
            .assess_answer(&payload.question, &transcription.text)
            .await?;

        Ok(VideoOutcome {
            video_url: submission.video_url,
            audio_url: submission.audio_url,
            transcript: transcription.text,
            score: assessment.score,
            feedback: assessment.feedback,
            relevance: assessment.relevance,
            clarity: assessment.clarity,
            confidence: assessment.confidence,
        })
    }
}
