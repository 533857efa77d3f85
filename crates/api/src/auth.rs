//! Bearer-token identity: HS256 JWTs whose `sub` is the user id.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use pathway_core::model::OwnerKey;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub token_ttl_mins: i64,
}

/// Sign a token for `user_id`.
///
/// # Errors
///
/// Returns the `jsonwebtoken` error if encoding fails.
pub fn issue_token(
    user_id: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + config.token_ttl_mins * 60,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Check signature and expiry, returning the claims.
///
/// # Errors
///
/// Returns the `jsonwebtoken` error for bad signatures, malformed or expired tokens.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Authenticated caller; rejects with 401 when the token is absent or invalid.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: OwnerKey,
}

impl AuthUser {
    /// The query or body `userId` must name the caller.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` when `requested` is absent or different.
    pub fn require_owner(&self, requested: Option<&str>) -> Result<&OwnerKey, AppError> {
        match requested {
            Some(id) if id == self.user_id.as_str() => Ok(&self.user_id),
            _ => {
                tracing::warn!(user = %self.user_id, requested = ?requested, "user id mismatch");
                Err(AppError::Forbidden)
            }
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let claims = validate_token(token.trim(), &state.config.jwt).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AppError::Unauthorized
        })?;
        let user_id = OwnerKey::new(claims.sub).map_err(|_| AppError::Unauthorized)?;
        Ok(Self { user_id })
    }
}
