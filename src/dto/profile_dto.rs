use serde::Deserialize;
use validator::Validate;

use crate::models::candidate::{ExperienceEntry, ProfileUpdate};

/// Profile fields the candidate reviewed after resume parsing.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfileRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(url(message = "resumeUrl must be a URL"))]
    pub resume_url: Option<String>,
    #[validate(length(max = 200))]
    pub designation: Option<String>,
    #[validate(length(max = 200))]
    pub applied_for: Option<String>,
    #[validate(length(max = 200))]
    pub experience: Option<String>,
    #[validate(length(max = 100))]
    pub skills: Option<Vec<String>>,
    pub companies: Option<Vec<String>>,
    pub degree: Option<Vec<String>>,
    pub college: Option<Vec<String>>,
    pub experience_timeline: Option<Vec<ExperienceEntry>>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn cleaned(values: Option<Vec<String>>) -> Option<Vec<String>> {
    values.map(|list| {
        list.into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    })
}

impl From<SaveProfileRequest> for ProfileUpdate {
    fn from(req: SaveProfileRequest) -> Self {
        Self {
            name: trimmed(req.name),
            phone: trimmed(req.phone),
            location: trimmed(req.location),
            resume_url: trimmed(req.resume_url),
            designation: trimmed(req.designation),
            applied_for: trimmed(req.applied_for),
            experience: trimmed(req.experience),
            skills: cleaned(req.skills),
            companies: cleaned(req.companies),
            degree: cleaned(req.degree),
            college: cleaned(req.college),
            experience_timeline: req.experience_timeline,
        }
    }
}
