use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::models::identity::AuthContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn into_context(self) -> Result<AuthContext> {
        let candidate_id = Uuid::parse_str(&self.sub).map_err(|_| Error::InvalidToken)?;
        let role = self.role.parse().map_err(|_| Error::InvalidToken)?;
        Ok(AuthContext {
            candidate_id,
            email: Some(self.email),
            role,
        })
    }
}

pub fn issue_token(secret: &str, ttl_hours: i64, candidate: &Candidate) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: candidate.id.to_string(),
        email: candidate.email.clone(),
        role: candidate.role.as_str().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("token signing failed: {}", e)))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => Error::TokenExpired,
        _ => Error::InvalidToken,
    })
}
