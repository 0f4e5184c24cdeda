use axum::extract::State;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{self, MaybeUser};
use crate::models::User;
use crate::permissions::{Action, AdminOnly, Policy};
use crate::repository::UserRepository;
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::created;

const MAX_USERNAME_LEN: usize = 150;

#[derive(Debug, Deserialize)]
pub struct NewUserBody {
    pub username: String,
    pub password: String,
    pub password_confirmation: String,
}

impl NewUserBody {
    fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() {
            return Err(AppError::ValidationError(
                "'username' must not be empty".to_string(),
            ));
        }
        if self.username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::ValidationError(format!(
                "'username' must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        if self.password.is_empty() {
            return Err(AppError::ValidationError(
                "'password' must not be empty".to_string(),
            ));
        }
        if self.password != self.password_confirmation {
            return Err(AppError::ValidationError(
                "Passwords do not match".to_string(),
            ));
        }
        Ok(())
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    MaybeUser(identity): MaybeUser,
    Json(body): Json<NewUserBody>,
) -> Result<Response, AppError> {
    AdminOnly
        .authorize(identity.as_ref(), Action::Write, None)
        .into_result()?;

    body.validate()?;

    let user = User {
        id: Uuid::new_v4(),
        username: body.username,
        password_hash: auth::hash_password(&body.password)?,
        is_admin: false,
        created_at: Utc::now(),
    };
    UserRepository::new(state.pool.clone()).insert(&user).await?;

    // `password_hash` is skipped during serialization.
    Ok(created(user, "User created"))
}
