use serde::{Deserialize, Serialize};

use crate::models::candidate::ExperienceEntry;

/// One span from the token-classification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NerEntity {
    pub entity_group: String,
    pub word: String,
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

/// Heuristic extraction result handed to the LLM normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResumeFields {
    pub names: Vec<String>,
    pub emails: Vec<String>,
    pub phone: String,
    pub location: String,
    pub summary: String,
    pub skills: Vec<String>,
    pub experience_years: String,
    pub experience_timeline: Vec<ExperienceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedResume {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
    pub designation: String,
    pub skills: Vec<String>,
    pub experience_timeline: Vec<ExperienceEntry>,
}
