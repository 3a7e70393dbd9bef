use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::store::Store;
use crate::error::{Error, Result};
use crate::models::attempt::{AttemptRecord, CompletedRecord, Completion, StageKind};
use crate::models::candidate::{Candidate, ProfileUpdate};

#[derive(Default)]
struct Tables {
    candidates: HashMap<Uuid, Candidate>,
    attempts: HashMap<Uuid, AttemptRecord>,
}

/// In-process store used by tests and local runs without Postgres.
///
/// Every mutation holds the single write lock, which gives the same
/// all-or-nothing claim semantics as the transactional Postgres store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn attempts_for(&self, candidate_id: Uuid, stage: StageKind) -> Vec<AttemptRecord> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<_> = tables
            .attempts
            .values()
            .filter(|a| a.candidate_id == candidate_id && a.stage == stage)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.created_at);
        attempts
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        Ok(self.tables.read().await.candidates.get(&id).cloned())
    }

    async fn find_candidate_by_email(&self, email: &str) -> Result<Option<Candidate>> {
        let tables = self.tables.read().await;
        Ok(tables.candidates.values().find(|c| c.email == email).cloned())
    }

    async fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate> {
        let mut tables = self.tables.write().await;
        if tables.candidates.values().any(|c| c.email == candidate.email) {
            return Err(Error::Validation(format!(
                "A candidate with email {} already exists",
                candidate.email
            )));
        }
        tables.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn save_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Candidate> {
        let mut tables = self.tables.write().await;
        let candidate = tables
            .candidates
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        update.apply(candidate);
        Ok(candidate.clone())
    }

    async fn find_attempt(&self, id: Uuid) -> Result<Option<AttemptRecord>> {
        Ok(self.tables.read().await.attempts.get(&id).cloned())
    }

    async fn find_open_attempt(
        &self,
        candidate_id: Uuid,
        stage: StageKind,
    ) -> Result<Option<AttemptRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attempts
            .values()
            .find(|a| a.candidate_id == candidate_id && a.stage == stage && !a.completed)
            .cloned())
    }

    async fn has_completed_attempt(&self, candidate_id: Uuid, stage: StageKind) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .attempts
            .values()
            .any(|a| a.candidate_id == candidate_id && a.stage == stage && a.completed))
    }

    async fn insert_open_attempt(&self, attempt: AttemptRecord) -> Result<AttemptRecord> {
        let mut tables = self.tables.write().await;
        if let Some(open) = tables.attempts.values().find(|a| {
            a.candidate_id == attempt.candidate_id && a.stage == attempt.stage && !a.completed
        }) {
            return Ok(open.clone());
        }
        tables.attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        candidate_id: Uuid,
        stage: StageKind,
        completion: Completion,
    ) -> Result<Option<CompletedRecord>> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let Some(attempt) = tables.attempts.get_mut(&attempt_id) else {
            return Ok(None);
        };
        if attempt.candidate_id != candidate_id || attempt.stage != stage || attempt.completed {
            return Ok(None);
        }
        let Some(candidate) = tables.candidates.get_mut(&candidate_id) else {
            return Ok(None);
        };

        attempt.completed = true;
        attempt.response = Some(completion.response);
        attempt.score = Some(completion.score);
        attempt.feedback = completion.feedback;
        attempt.completed_at = Some(Utc::now());

        match stage {
            StageKind::Mcq => candidate.mcq_score = Some(completion.score),
            StageKind::Video => candidate.video_score = Some(completion.score),
            StageKind::Coding => candidate.coding_score = Some(completion.score),
        }
        candidate.current_step = candidate.current_step.advance_to(stage.next_step());

        Ok(Some(CompletedRecord {
            attempt: attempt.clone(),
            current_step: candidate.current_step,
        }))
    }
}
