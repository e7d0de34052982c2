//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs issued by the auth provider and verified against
//! a shared secret. The API only consumes the identity fact: a user id
//! and, when present, an email.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[allow(dead_code)]
    exp: usize,
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Verify a bearer token and extract the caller identity.
pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Tokens carry a provider-specific audience; we only care about
    // subject and expiry.
    validation.validate_aud = false;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

    let id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| ApiError::unauthorized("Invalid subject claim"))?;

    Ok(AuthUser {
        id,
        email: data.claims.email,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Expected Bearer token"))?;

        verify_token(token, &state.config.jwt_secret)
    }
}
