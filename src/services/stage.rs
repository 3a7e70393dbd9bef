use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::models::attempt::StageKind;
use crate::models::candidate::Candidate;

/// Score and feedback persisted on the attempt and mirrored onto the candidate.
pub trait Graded {
    fn recorded_score(&self) -> i32;

    fn recorded_feedback(&self) -> Option<String> {
        None
    }
}

/// Stage-specific content generation and scoring plugged into the shared
/// attempt lifecycle.
#[async_trait]
pub trait Stage: Send + Sync {
    const KIND: StageKind;

    /// Content fixed at start and stored on the attempt.
    type Payload: Serialize + DeserializeOwned + Send + Sync;
    /// What the candidate sees of the payload.
    type View: Serialize + Send;
    type Submission: Send + 'static;
    type Outcome: Graded + Serialize + Send;

    async fn generate(&self, candidate: &Candidate) -> Result<Self::Payload>;

    fn view(&self, payload: &Self::Payload) -> Self::View;

    /// Must not touch persistent state; failures leave the attempt open.
    async fn score(
        &self,
        payload: &Self::Payload,
        submission: Self::Submission,
    ) -> Result<Self::Outcome>;
}
