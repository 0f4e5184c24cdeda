use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{issue_token, verify_token, TokenKind};
use crate::repository::UserRepository;
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

pub async fn token(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> Result<Response, AppError> {
    let user = UserRepository::new(state.pool.clone())
        .find_by_username(&body.username)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid username or password".to_string()))?;

    if !crate::auth::verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::AuthError(
            "Invalid username or password".to_string(),
        ));
    }

    let config = &state.config;
    let pair = TokenPair {
        access: issue_token(
            &user,
            TokenKind::Access,
            &config.jwt_secret,
            config.access_ttl_secs,
        )?,
        refresh: issue_token(
            &user,
            TokenKind::Refresh,
            &config.jwt_secret,
            config.refresh_ttl_secs,
        )?,
    };
    Ok(success(pair, "Tokens issued"))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Response, AppError> {
    let claims = verify_token(&body.refresh, TokenKind::Refresh, &state.config.jwt_secret)?;

    // Re-read the account so a revoked user cannot keep minting tokens.
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;

    let access = issue_token(
        &user,
        TokenKind::Access,
        &state.config.jwt_secret,
        state.config.access_ttl_secs,
    )?;
    Ok(success(AccessToken { access }, "Token refreshed"))
}
