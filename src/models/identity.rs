use uuid::Uuid;

use crate::models::candidate::Role;

/// Identity decoded from the bearer token, handed explicitly to every
/// stage operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub candidate_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

impl AuthContext {
    pub fn candidate(candidate_id: Uuid) -> Self {
        Self {
            candidate_id,
            email: None,
            role: Role::Candidate,
        }
    }
}
