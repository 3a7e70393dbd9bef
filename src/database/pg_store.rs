use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store::Store;
use crate::error::{Error, Result};
use crate::models::attempt::{AttemptRecord, AttemptRow, CompletedRecord, Completion, StageKind};
use crate::models::candidate::{Candidate, CandidateRow, ProfileUpdate, Step};

const CANDIDATE_COLUMNS: &str = r#"
    id, name, email, password_hash, role, phone, location, resume_url, current_step,
    skills, designation, applied_for, experience, experience_timeline, companies,
    degree, college, mcq_score, video_score, coding_score, created_at
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {} FROM candidates WHERE id = $1",
            CANDIDATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Candidate::try_from).transpose()
    }

    async fn find_candidate_by_email(&self, email: &str) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {} FROM candidates WHERE email = $1",
            CANDIDATE_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Candidate::try_from).transpose()
    }

    async fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate> {
        let timeline = serde_json::to_value(&candidate.experience_timeline)?;
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            r#"
            INSERT INTO candidates (id, name, email, password_hash, role, current_step, experience_timeline, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (email) DO NOTHING
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        ))
        .bind(candidate.id)
        .bind(&candidate.name)
        .bind(&candidate.email)
        .bind(&candidate.password_hash)
        .bind(candidate.role.as_str())
        .bind(candidate.current_step.as_str())
        .bind(timeline)
        .bind(candidate.created_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Candidate::try_from(row),
            None => Err(Error::Validation(format!(
                "A candidate with email {} already exists",
                candidate.email
            ))),
        }
    }

    async fn save_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Candidate> {
        let timeline = update
            .experience_timeline
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            r#"
            UPDATE candidates SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                location = COALESCE($4, location),
                resume_url = COALESCE($5, resume_url),
                designation = COALESCE($6, designation),
                applied_for = COALESCE($7, applied_for),
                experience = COALESCE($8, experience),
                skills = COALESCE($9, skills),
                companies = COALESCE($10, companies),
                degree = COALESCE($11, degree),
                college = COALESCE($12, college),
                experience_timeline = COALESCE($13, experience_timeline),
                current_step = CASE
                    WHEN step_rank(current_step) < step_rank($14) THEN $14
                    ELSE current_step
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.phone)
        .bind(update.location)
        .bind(update.resume_url)
        .bind(update.designation)
        .bind(update.applied_for)
        .bind(update.experience)
        .bind(update.skills)
        .bind(update.companies)
        .bind(update.degree)
        .bind(update.college)
        .bind(timeline)
        .bind(Step::Mcq.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Candidate::try_from)
            .transpose()?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }

    async fn find_attempt(&self, id: Uuid) -> Result<Option<AttemptRecord>> {
        let row = sqlx::query_as::<_, AttemptRow>(r#"SELECT * FROM attempts WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(AttemptRecord::try_from).transpose()
    }

    async fn find_open_attempt(
        &self,
        candidate_id: Uuid,
        stage: StageKind,
    ) -> Result<Option<AttemptRecord>> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT * FROM attempts
            WHERE candidate_id = $1 AND stage = $2 AND completed = FALSE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(candidate_id)
        .bind(stage.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(AttemptRecord::try_from).transpose()
    }

    async fn has_completed_attempt(&self, candidate_id: Uuid, stage: StageKind) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM attempts
                WHERE candidate_id = $1 AND stage = $2 AND completed = TRUE
            )
            "#,
        )
        .bind(candidate_id)
        .bind(stage.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_open_attempt(&self, attempt: AttemptRecord) -> Result<AttemptRecord> {
        let inserted = sqlx::query_as::<_, AttemptRow>(
            r#"
            INSERT INTO attempts (id, candidate_id, stage, payload, completed, created_at)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            ON CONFLICT (candidate_id, stage) WHERE completed = FALSE DO NOTHING
            RETURNING *
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.candidate_id)
        .bind(attempt.stage.as_str())
        .bind(&attempt.payload)
        .bind(attempt.created_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return AttemptRecord::try_from(row);
        }

        // lost the race against a concurrent start; hand back the winner
        self.find_open_attempt(attempt.candidate_id, attempt.stage)
            .await?
            .ok_or_else(|| Error::Internal("open attempt vanished after insert conflict".into()))
    }

    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        candidate_id: Uuid,
        stage: StageKind,
        completion: Completion,
    ) -> Result<Option<CompletedRecord>> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query_as::<_, AttemptRow>(
            r#"
            UPDATE attempts
            SET completed = TRUE,
                response = $4,
                score = $5,
                feedback = $6,
                completed_at = NOW()
            WHERE id = $1 AND candidate_id = $2 AND stage = $3 AND completed = FALSE
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(candidate_id)
        .bind(stage.as_str())
        .bind(&completion.response)
        .bind(completion.score)
        .bind(&completion.feedback)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = claimed else {
            tx.rollback().await?;
            return Ok(None);
        };

        // score_column() only yields fixed column names
        let current_step: String = sqlx::query_scalar(&format!(
            r#"
            UPDATE candidates
            SET {column} = $2,
                current_step = CASE
                    WHEN step_rank(current_step) < step_rank($3) THEN $3
                    ELSE current_step
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING current_step
            "#,
            column = stage.score_column()
        ))
        .bind(candidate_id)
        .bind(completion.score)
        .bind(stage.next_step().as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(CompletedRecord {
            attempt: AttemptRecord::try_from(row)?,
            current_step: current_step.parse()?,
        }))
    }
}
