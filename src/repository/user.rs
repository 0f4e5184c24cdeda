use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;
use crate::repository::unique_violation;
use crate::utils::error::AppError;

const USER_COLUMNS: &str = "id, username, password_hash, is_admin, created_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, is_admin, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if unique_violation(&e, "users_username_key") {
                AppError::ValidationError("This username is already taken".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })?;
        Ok(())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    /// Startup bootstrap: create or refresh the administrator account.
    pub async fn upsert_admin(&self, username: &str, password_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, is_admin, created_at) \
             VALUES ($1, $2, $3, TRUE, now()) \
             ON CONFLICT (username) \
             DO UPDATE SET password_hash = EXCLUDED.password_hash, is_admin = TRUE",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
