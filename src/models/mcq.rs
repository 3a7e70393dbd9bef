use serde::{Deserialize, Serialize};

pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqPayload {
    pub questions: Vec<McqQuestion>,
}

/// Question as shown to the candidate; the correct index stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicMcqQuestion {
    pub question: String,
    pub options: Vec<String>,
}

impl From<&McqQuestion> for PublicMcqQuestion {
    fn from(q: &McqQuestion) -> Self {
        Self {
            question: q.question.clone(),
            options: q.options.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqOutcome {
    pub answers: Vec<u8>,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
}
