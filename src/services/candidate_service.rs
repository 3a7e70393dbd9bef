use std::sync::Arc;

use crate::database::Store;
use crate::error::{Error, Result};
use crate::models::candidate::{normalize_email, Candidate, NewCandidate, ProfileUpdate, Role};
use crate::models::identity::AuthContext;
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::token::issue_token;

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub candidate: Candidate,
}

#[derive(Clone)]
pub struct CandidateService {
    store: Arc<dyn Store>,
    jwt_secret: String,
    jwt_ttl_hours: i64,
}

impl CandidateService {
    pub fn new(store: Arc<dyn Store>, jwt_secret: String, jwt_ttl_hours: i64) -> Self {
        Self {
            store,
            jwt_secret,
            jwt_ttl_hours,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult> {
        let email = normalize_email(email);
        let Some(candidate) = self.store.find_candidate_by_email(&email).await? else {
            tracing::info!("login rejected: unknown email");
            return Err(Error::InvalidCredentials);
        };
        if !verify_password(password, &candidate.password_hash) {
            tracing::info!(candidate_id = %candidate.id, "login rejected: bad password");
            return Err(Error::InvalidCredentials);
        }

        let token = issue_token(&self.jwt_secret, self.jwt_ttl_hours, &candidate)?;
        tracing::info!(candidate_id = %candidate.id, role = candidate.role.as_str(), "candidate logged in");
        Ok(LoginResult { token, candidate })
    }

    pub async fn profile(&self, ctx: &AuthContext) -> Result<Candidate> {
        self.store
            .find_candidate(ctx.candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }

    pub async fn save_profile(&self, ctx: &AuthContext, update: ProfileUpdate) -> Result<Candidate> {
        let candidate = self.store.save_profile(ctx.candidate_id, update).await?;
        tracing::info!(
            candidate_id = %candidate.id,
            current_step = %candidate.current_step,
            "profile saved"
        );
        Ok(candidate)
    }

    /// Creates an account with a freshly hashed password.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Candidate> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "Name, email and password are required".to_string(),
            ));
        }
        let candidate = Candidate::provision(NewCandidate {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            role,
        });
        let candidate = self.store.insert_candidate(candidate).await?;
        tracing::info!(candidate_id = %candidate.id, role = role.as_str(), "candidate registered");
        Ok(candidate)
    }
}
