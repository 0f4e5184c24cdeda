//! Token-based identity resolution.
//!
//! Access and refresh tokens are HS256 JWTs. Handlers take the [`MaybeUser`]
//! extractor when reads must stay open and let the permission policies decide
//! 401 vs 403; [`CurrentUser`] is the shorthand for endpoints that always
//! require an identity.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::models::User;
use crate::routes::AppState;
use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub is_admin: bool,
    pub kind: TokenKind,
    pub exp: i64,
}

/// Identity resolved from a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

pub fn issue_token(
    user: &User,
    kind: TokenKind,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        is_admin: user.is_admin,
        kind,
        exp: Utc::now().timestamp() + ttl_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to sign token: {e}")))
}

pub fn verify_token(token: &str, kind: TokenKind, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid or expired token".to_string()))?;

    if data.claims.kind != kind {
        return Err(AppError::AuthError("Wrong token type".to_string()));
    }
    Ok(data.claims)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::InternalServerError(format!("Stored hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Optional identity: anonymous requests pass through as `None`, but a
/// present-yet-invalid token is rejected outright.
pub struct MaybeUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(h) => h,
            None => return Ok(MaybeUser(None)),
        };
        let token = extract_bearer_token(header).ok_or_else(|| {
            AppError::AuthError("Invalid Authorization header format".to_string())
        })?;

        let state = AppState::from_ref(state);
        let claims = verify_token(token, TokenKind::Access, &state.config.jwt_secret)?;

        Ok(MaybeUser(Some(AuthUser {
            id: claims.sub,
            username: claims.username,
            is_admin: claims.is_admin,
        })))
    }
}

/// Required identity; rejects anonymous requests with 401.
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        match user {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(AppError::AuthError(
                "Authentication required for this action".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "joao".to_string(),
            password_hash: String::new(),
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let user = sample_user();
        let token = issue_token(&user, TokenKind::Access, "secret", 60).unwrap();
        let claims = verify_token(&token, TokenKind::Access, "secret").unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "joao");
        assert!(!claims.is_admin);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let user = sample_user();
        let token = issue_token(&user, TokenKind::Refresh, "secret", 60).unwrap();
        assert!(verify_token(&token, TokenKind::Access, "secret").is_err());
        assert!(verify_token(&token, TokenKind::Refresh, "secret").is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let user = sample_user();
        let token = issue_token(&user, TokenKind::Access, "secret", 60).unwrap();
        assert!(verify_token(&token, TokenKind::Access, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let user = sample_user();
        let token = issue_token(&user, TokenKind::Access, "secret", -120).unwrap();
        assert!(verify_token(&token, TokenKind::Access, "secret").is_err());
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("s3nh4-forte").unwrap();
        assert!(verify_password("s3nh4-forte", &hash).unwrap());
        assert!(!verify_password("outra-senha", &hash).unwrap());
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
