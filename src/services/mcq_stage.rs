use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::attempt::StageKind;
use crate::models::candidate::Candidate;
use crate::models::mcq::{McqOutcome, McqPayload, PublicMcqQuestion};
use crate::services::ai_service::{fallback_mcqs, QuestionGenerator};
use crate::services::grading_service::grade_mcq;
use crate::services::stage::{Graded, Stage};

#[derive(Debug, Clone, Serialize)]
pub struct McqView {
    pub questions: Vec<PublicMcqQuestion>,
}

/// Stored score is the count of correct answers; the percentage is
/// reported back to the candidate only.
impl Graded for McqOutcome {
    fn recorded_score(&self) -> i32 {
        self.score as i32
    }
}

pub struct McqStage {
    generator: Arc<dyn QuestionGenerator>,
}

impl McqStage {
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Stage for McqStage {
    const KIND: StageKind = StageKind::Mcq;

    type Payload = McqPayload;
    type View = McqView;
    type Submission = Vec<u8>;
    type Outcome = McqOutcome;

    async fn generate(&self, candidate: &Candidate) -> Result<McqPayload> {
        let questions = match self.generator.generate_mcqs(candidate).await {
            Ok(questions) => questions,
            Err(e) => {
                tracing::warn!(
                    candidate_id = %candidate.id,
                    error = %e,
                    "mcq generation failed, serving fallback set"
                );
                fallback_mcqs()
            }
        };
        Ok(McqPayload { questions })
    }

    fn view(&self, payload: &McqPayload) -> McqView {
        McqView {
            questions: payload.questions.iter().map(PublicMcqQuestion::from).collect(),
        }
    }

    async fn score(&self, payload: &McqPayload, answers: Vec<u8>) -> Result<McqOutcome> {
        grade_mcq(&payload.questions, &answers)
    }
}
