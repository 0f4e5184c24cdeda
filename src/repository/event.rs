use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Event;
use crate::repository::unique_violation;
use crate::utils::error::AppError;

const EVENT_COLUMNS: &str = "id, title, description, date, time, location, capacity, \
                             category, creator_id, created_at, updated_at";

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY date, time, title"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event =
            sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(event)
    }

    /// True when another event already occupies the same (title, date, time)
    /// slot. `exclude` skips the event being updated.
    pub async fn slot_taken(
        &self,
        title: &str,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let found: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM events \
             WHERE title = $1 AND date = $2 AND time = $3 AND ($4::uuid IS NULL OR id <> $4)",
        )
        .bind(title)
        .bind(date)
        .bind(time)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    pub async fn insert(&self, event: &Event) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO events \
             (id, title, description, date, time, location, capacity, category, creator_id, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.time)
        .bind(&event.location)
        .bind(event.capacity)
        .bind(event.category)
        .bind(event.creator_id)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Unique index backstop for the application-level slot check.
            if unique_violation(&e, "events_title_date_time_key") {
                AppError::ValidationError(
                    "An event with this title, date and time already exists".to_string(),
                )
            } else {
                AppError::DatabaseError(e)
            }
        })?;
        Ok(())
    }

    /// Persists every mutable field. `creator_id` is deliberately absent.
    pub async fn update(&self, event: &Event) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE events SET title = $2, description = $3, date = $4, time = $5, \
             location = $6, capacity = $7, category = $8, updated_at = $9 \
             WHERE id = $1",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.time)
        .bind(&event.location)
        .bind(event.capacity)
        .bind(event.category)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if unique_violation(&e, "events_title_date_time_key") {
                AppError::ValidationError(
                    "An event with this title, date and time already exists".to_string(),
                )
            } else {
                AppError::DatabaseError(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".to_string()));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
