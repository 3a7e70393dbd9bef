use std::sync::Arc;

use uuid::Uuid;

use crate::database::Store;
use crate::error::{Error, Result};
use crate::models::attempt::{AttemptRecord, Completion};
use crate::models::candidate::{Candidate, Step};
use crate::models::identity::AuthContext;
use crate::services::stage::{Graded, Stage};

#[derive(Debug, Clone)]
pub struct StartedAttempt<V> {
    pub attempt_id: Uuid,
    pub view: V,
    /// True when an already open attempt was handed back.
    pub resumed: bool,
}

#[derive(Debug, Clone)]
pub struct CompletedAttempt<O> {
    pub attempt_id: Uuid,
    pub outcome: O,
    pub current_step: Step,
}

/// The start/submit lifecycle shared by every assessment stage.
pub struct AttemptService<S> {
    store: Arc<dyn Store>,
    stage: S,
}

impl<S: Stage> AttemptService<S> {
    pub fn new(store: Arc<dyn Store>, stage: S) -> Self {
        Self { store, stage }
    }

    pub async fn start(&self, ctx: &AuthContext) -> Result<StartedAttempt<S::View>> {
        let candidate_id = ctx.candidate_id;
        let candidate = self.unlocked_candidate(candidate_id).await?;

        if let Some(open) = self.store.find_open_attempt(candidate_id, S::KIND).await? {
            tracing::info!(%candidate_id, attempt_id = %open.id, stage = %S::KIND, "resuming open attempt");
            return self.started(open, true);
        }

        if self.store.has_completed_attempt(candidate_id, S::KIND).await? {
            tracing::info!(%candidate_id, stage = %S::KIND, "start refused, stage already completed");
            return Err(Error::StageCompleted(S::KIND));
        }

        let payload = self.stage.generate(&candidate).await.map_err(|e| {
            tracing::error!(%candidate_id, stage = %S::KIND, error = %e, "stage content generation failed");
            e
        })?;

        let fresh = AttemptRecord::open(candidate_id, S::KIND, serde_json::to_value(&payload)?);
        let fresh_id = fresh.id;
        let stored = self.store.insert_open_attempt(fresh).await?;

        if stored.id != fresh_id {
            tracing::info!(%candidate_id, attempt_id = %stored.id, stage = %S::KIND, "concurrent start, reusing winner");
            return self.started(stored, true);
        }

        tracing::info!(%candidate_id, attempt_id = %stored.id, stage = %S::KIND, "attempt started");
        Ok(StartedAttempt {
            attempt_id: stored.id,
            view: self.stage.view(&payload),
            resumed: false,
        })
    }

    /// Loads the candidate and refuses stages that lie ahead of their step.
    async fn unlocked_candidate(&self, candidate_id: Uuid) -> Result<Candidate> {
        let candidate = self
            .store
            .find_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

        if candidate.current_step < S::KIND.entry_step() {
            tracing::info!(
                %candidate_id,
                stage = %S::KIND,
                current_step = %candidate.current_step,
                "stage refused, not unlocked yet"
            );
            return Err(Error::StageLocked(S::KIND));
        }
        Ok(candidate)
    }

    fn started(&self, attempt: AttemptRecord, resumed: bool) -> Result<StartedAttempt<S::View>> {
        let payload: S::Payload = serde_json::from_value(attempt.payload)?;
        Ok(StartedAttempt {
            attempt_id: attempt.id,
            view: self.stage.view(&payload),
            resumed,
        })
    }

    pub async fn submit(
        &self,
        ctx: &AuthContext,
        attempt_id: Uuid,
        submission: S::Submission,
    ) -> Result<CompletedAttempt<S::Outcome>> {
        let candidate_id = ctx.candidate_id;

        let attempt = self
            .store
            .find_attempt(attempt_id)
            .await?
            .filter(|a| a.is_owned_by(candidate_id) && a.stage == S::KIND)
            .ok_or_else(|| {
                tracing::warn!(%candidate_id, %attempt_id, stage = %S::KIND, "submit for unknown or foreign attempt");
                Error::AttemptNotFound
            })?;

        if attempt.completed {
            tracing::info!(%candidate_id, %attempt_id, stage = %S::KIND, "submit for completed attempt");
            return Err(Error::AttemptCompleted);
        }

        self.unlocked_candidate(candidate_id).await?;

        let payload: S::Payload = serde_json::from_value(attempt.payload)?;
        let outcome = self.stage.score(&payload, submission).await.map_err(|e| {
            tracing::warn!(%candidate_id, %attempt_id, stage = %S::KIND, error = %e, "scoring failed, attempt left open");
            e
        })?;

        let completion = Completion {
            response: serde_json::to_value(&outcome)?,
            score: outcome.recorded_score(),
            feedback: outcome.recorded_feedback(),
        };
        let score = completion.score;

        let Some(done) = self
            .store
            .complete_attempt(attempt_id, candidate_id, S::KIND, completion)
            .await?
        else {
            tracing::warn!(%candidate_id, %attempt_id, stage = %S::KIND, "attempt claimed by a concurrent submit");
            return Err(Error::AttemptCompleted);
        };

        tracing::info!(
            %candidate_id,
            %attempt_id,
            stage = %S::KIND,
            score,
            current_step = %done.current_step,
            "attempt completed"
        );
        Ok(CompletedAttempt {
            attempt_id,
            outcome,
            current_step: done.current_step,
        })
    }
}
