use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Position of a candidate in the assessment pipeline.
///
/// Variants are declared in pipeline order, so the derived `Ord` is the
/// progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Info,
    Mcq,
    Video,
    Coding,
    Completed,
}

impl Step {
    pub const ORDER: [Step; 5] = [
        Step::Info,
        Step::Mcq,
        Step::Video,
        Step::Coding,
        Step::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Info => "info",
            Step::Mcq => "mcq",
            Step::Video => "video",
            Step::Coding => "coding",
            Step::Completed => "completed",
        }
    }

    pub fn next(self) -> Option<Step> {
        match self {
            Step::Info => Some(Step::Mcq),
            Step::Mcq => Some(Step::Video),
            Step::Video => Some(Step::Coding),
            Step::Coding => Some(Step::Completed),
            Step::Completed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Step::Completed
    }

    /// Forward-only move: returns `target` if it lies ahead, otherwise stays.
    pub fn advance_to(self, target: Step) -> Step {
        self.max(target)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Step::ORDER
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| Error::Internal(format!("unknown pipeline step '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Hr,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Hr => "hr",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "candidate" => Ok(Role::Candidate),
            "hr" => Ok(Role::Hr),
            other => Err(Error::Validation(format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub resume_url: Option<String>,
    pub current_step: Step,
    pub skills: Vec<String>,
    pub designation: Option<String>,
    pub applied_for: Option<String>,
    pub experience: Option<String>,
    pub experience_timeline: Vec<ExperienceEntry>,
    pub companies: Vec<String>,
    pub degree: Vec<String>,
    pub college: Vec<String>,
    pub mcq_score: Option<i32>,
    pub video_score: Option<i32>,
    pub coding_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Account provisioning input; profile fields are filled in later.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl Candidate {
    pub fn provision(new: NewCandidate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            email: normalize_email(&new.email),
            password_hash: new.password_hash,
            role: new.role,
            phone: None,
            location: None,
            resume_url: None,
            current_step: Step::Info,
            skills: Vec::new(),
            designation: None,
            applied_for: None,
            experience: None,
            experience_timeline: Vec::new(),
            companies: Vec::new(),
            degree: Vec::new(),
            college: Vec::new(),
            mcq_score: None,
            video_score: None,
            coding_score: None,
            created_at: Utc::now(),
        }
    }
}

/// Reviewed profile fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub resume_url: Option<String>,
    pub designation: Option<String>,
    pub applied_for: Option<String>,
    pub experience: Option<String>,
    pub skills: Option<Vec<String>>,
    pub companies: Option<Vec<String>>,
    pub degree: Option<Vec<String>>,
    pub college: Option<Vec<String>>,
    pub experience_timeline: Option<Vec<ExperienceEntry>>,
}

impl ProfileUpdate {
    pub fn apply(self, candidate: &mut Candidate) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        set(&mut candidate.name, self.name);
        set(&mut candidate.phone, self.phone.map(Some));
        set(&mut candidate.location, self.location.map(Some));
        set(&mut candidate.resume_url, self.resume_url.map(Some));
        set(&mut candidate.designation, self.designation.map(Some));
        set(&mut candidate.applied_for, self.applied_for.map(Some));
        set(&mut candidate.experience, self.experience.map(Some));
        set(&mut candidate.skills, self.skills);
        set(&mut candidate.companies, self.companies);
        set(&mut candidate.degree, self.degree);
        set(&mut candidate.college, self.college);
        set(&mut candidate.experience_timeline, self.experience_timeline);
        candidate.current_step = candidate.current_step.advance_to(Step::Mcq);
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub resume_url: Option<String>,
    pub current_step: String,
    pub skills: Vec<String>,
    pub designation: Option<String>,
    pub applied_for: Option<String>,
    pub experience: Option<String>,
    pub experience_timeline: JsonValue,
    pub companies: Vec<String>,
    pub degree: Vec<String>,
    pub college: Vec<String>,
    pub mcq_score: Option<i32>,
    pub video_score: Option<i32>,
    pub coding_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = Error;

    fn try_from(row: CandidateRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse()?,
            phone: row.phone,
            location: row.location,
            resume_url: row.resume_url,
            current_step: row.current_step.parse()?,
            skills: row.skills,
            designation: row.designation,
            applied_for: row.applied_for,
            experience: row.experience,
            experience_timeline: serde_json::from_value(row.experience_timeline)?,
            companies: row.companies,
            degree: row.degree,
            college: row.college,
            mcq_score: row.mcq_score,
            video_score: row.video_score,
            coding_score: row.coding_score,
            created_at: row.created_at,
        })
    }
}
