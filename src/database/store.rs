use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::attempt::{AttemptRecord, CompletedRecord, Completion, StageKind};
use crate::models::candidate::{Candidate, ProfileUpdate};

/// Persistence boundary for candidates and stage attempts.
///
/// Implementations must make `complete_attempt` a single atomic claim: the
/// attempt row flips to completed, the candidate's stage score is recorded
/// and `current_step` moves forward, or nothing changes at all.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>>;

    async fn find_candidate_by_email(&self, email: &str) -> Result<Option<Candidate>>;

    async fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate>;

    async fn save_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Candidate>;

    async fn find_attempt(&self, id: Uuid) -> Result<Option<AttemptRecord>>;

    async fn find_open_attempt(
        &self,
        candidate_id: Uuid,
        stage: StageKind,
    ) -> Result<Option<AttemptRecord>>;

    async fn has_completed_attempt(&self, candidate_id: Uuid, stage: StageKind) -> Result<bool>;

    /// Inserts `attempt` unless the candidate already has an open attempt for
    /// the same stage, in which case the existing one is returned instead.
    async fn insert_open_attempt(&self, attempt: AttemptRecord) -> Result<AttemptRecord>;

    /// Returns `None` when the attempt is missing, belongs to someone else,
    /// is for another stage, or was already completed.
    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        candidate_id: Uuid,
        stage: StageKind,
        completion: Completion,
    ) -> Result<Option<CompletedRecord>>;
}
