use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::candidate::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Mcq,
    Video,
    Coding,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Mcq => "mcq",
            StageKind::Video => "video",
            StageKind::Coding => "coding",
        }
    }

    /// Earliest step from which this stage may be started or submitted.
    pub fn entry_step(self) -> Step {
        match self {
            StageKind::Mcq => Step::Mcq,
            StageKind::Video => Step::Video,
            StageKind::Coding => Step::Coding,
        }
    }

    /// Step a candidate moves to once this stage is submitted.
    pub fn next_step(self) -> Step {
        match self {
            StageKind::Mcq => Step::Video,
            StageKind::Video => Step::Coding,
            StageKind::Coding => Step::Completed,
        }
    }

    /// Candidate column that mirrors this stage's score.
    pub fn score_column(self) -> &'static str {
        match self {
            StageKind::Mcq => "mcq_score",
            StageKind::Video => "video_score",
            StageKind::Coding => "coding_score",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mcq" => Ok(StageKind::Mcq),
            "video" => Ok(StageKind::Video),
            "coding" => Ok(StageKind::Coding),
            other => Err(Error::Internal(format!("unknown stage '{}'", other))),
        }
    }
}

/// Stage-agnostic attempt as persisted. `payload` is fixed at creation,
/// `response`/`score`/`feedback` are written once, together with `completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub stage: StageKind,
    pub payload: JsonValue,
    pub response: Option<JsonValue>,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    pub fn open(candidate_id: Uuid, stage: StageKind, payload: JsonValue) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate_id,
            stage,
            payload,
            response: None,
            score: None,
            feedback: None,
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_owned_by(&self, candidate_id: Uuid) -> bool {
        self.candidate_id == candidate_id
    }
}

/// The single mutation applied when an attempt is submitted.
#[derive(Debug, Clone)]
pub struct Completion {
    pub response: JsonValue,
    pub score: i32,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompletedRecord {
    pub attempt: AttemptRecord,
    pub current_step: Step,
}

#[derive(Debug, Clone, FromRow)]
pub struct AttemptRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub stage: String,
    pub payload: JsonValue,
    pub response: Option<JsonValue>,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<AttemptRow> for AttemptRecord {
    type Error = Error;

    fn try_from(row: AttemptRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            candidate_id: row.candidate_id,
            stage: row.stage.parse()?,
            payload: row.payload,
            response: row.response,
            score: row.score,
            feedback: row.feedback,
            completed: row.completed,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_to_the_following_step() {
        assert_eq!(StageKind::Mcq.next_step(), Step::Video);
        assert_eq!(StageKind::Video.next_step(), Step::Coding);
        assert_eq!(StageKind::Coding.next_step(), Step::Completed);
    }

    #[test]
    fn each_stage_unlocks_at_its_own_step() {
        for stage in [StageKind::Mcq, StageKind::Video, StageKind::Coding] {
            assert_eq!(stage.entry_step().next(), Some(stage.next_step()));
        }
    }

    #[test]
    fn new_attempts_start_open() {
        let owner = Uuid::new_v4();
        let attempt = AttemptRecord::open(owner, StageKind::Video, serde_json::json!({"question": "q"}));
        assert!(!attempt.completed);
        assert!(attempt.is_owned_by(owner));
        assert!(!attempt.is_owned_by(Uuid::new_v4()));
        assert!(attempt.response.is_none());
    }
}
