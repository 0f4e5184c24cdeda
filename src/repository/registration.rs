use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::admission;
use crate::models::Registration;
use crate::repository::unique_violation;
use crate::utils::error::AppError;

#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Admit `user_id` to `event_id`, or fail without writing anything.
    ///
    /// The whole count-then-insert sequence runs in one transaction holding a
    /// row lock on the event, so two concurrent requests for the same event
    /// serialize here. The unique index on (user_id, event_id) closes the
    /// remaining duplicate race at the storage layer.
    pub async fn register(&self, user_id: Uuid, event_id: Uuid) -> Result<Registration, AppError> {
        let mut tx = self.pool.begin().await?;

        let capacity: Option<i32> =
            sqlx::query_scalar("SELECT capacity FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;
        let capacity = capacity.ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let registered: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await?;

        let duplicate: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM registrations WHERE event_id = $1 AND user_id = $2",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        // Early return rolls the transaction back on drop.
        admission::admit(capacity, registered, duplicate.is_some())?;

        let registration = Registration {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            registration_date: Utc::now().date_naive(),
        };
        sqlx::query(
            "INSERT INTO registrations (id, user_id, event_id, registration_date) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(registration.id)
        .bind(registration.user_id)
        .bind(registration.event_id)
        .bind(registration.registration_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if unique_violation(&e, "registrations_user_event_key") {
                AppError::DuplicateRegistration(
                    "You are already registered for this event".to_string(),
                )
            } else {
                AppError::DatabaseError(e)
            }
        })?;

        tx.commit().await?;
        Ok(registration)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Registration>, AppError> {
        let registrations = sqlx::query_as::<_, Registration>(
            "SELECT id, user_id, event_id, registration_date \
             FROM registrations WHERE user_id = $1 ORDER BY registration_date, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(registrations)
    }
}

// Run with: DATABASE_URL=postgres://... cargo test -- --ignored
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, EventCategory, User};
    use crate::repository::{EventRepository, UserRepository};
    use chrono::NaiveTime;
    use sqlx::postgres::PgPoolOptions;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must point at a running Postgres for this test");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await
            .expect("connect");
        sqlx::migrate!().run(&pool).await.expect("migrate");
        pool
    }

    async fn create_user(pool: &PgPool) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: format!("user-{}", Uuid::new_v4()),
            password_hash: "unused".to_string(),
            is_admin: false,
            created_at: Utc::now(),
        };
        UserRepository::new(pool.clone()).insert(&user).await.expect("insert user");
        user
    }

    async fn create_event(pool: &PgPool, capacity: i32, creator_id: Uuid) -> Event {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: format!("evt-{}", &Uuid::new_v4().to_string()[..8]),
            description: "concurrency fixture".to_string(),
            date: now.date_naive(),
            time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            location: "Sala 3".to_string(),
            capacity,
            category: EventCategory::Tecnologia,
            creator_id,
            created_at: now,
            updated_at: now,
        };
        EventRepository::new(pool.clone()).insert(&event).await.expect("insert event");
        event
    }

    async fn count_rows(pool: &PgPool, event_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(pool)
            .await
            .expect("count")
    }

    #[tokio::test]
    #[ignore = "needs a running Postgres (DATABASE_URL)"]
    async fn concurrent_registrations_never_exceed_capacity() {
        let pool = test_pool().await;
        let creator = create_user(&pool).await;
        let event = create_event(&pool, 1, creator.id).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let user = create_user(&pool).await;
            let repo = RegistrationRepository::new(pool.clone());
            let event_id = event.id;
            handles.push(tokio::spawn(async move { repo.register(user.id, event_id).await }));
        }

        let mut admitted = 0;
        let mut capacity_rejections = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(AppError::CapacityExceeded(_)) => capacity_rejections += 1,
                Err(other) => panic!("unexpected admission outcome: {other:?}"),
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(capacity_rejections, 7);
        assert_eq!(count_rows(&pool, event.id).await, 1);
    }

    #[tokio::test]
    #[ignore = "needs a running Postgres (DATABASE_URL)"]
    async fn concurrent_duplicates_yield_exactly_one_row() {
        let pool = test_pool().await;
        let creator = create_user(&pool).await;
        let event = create_event(&pool, 10, creator.id).await;
        let user = create_user(&pool).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = RegistrationRepository::new(pool.clone());
            let (user_id, event_id) = (user.id, event.id);
            handles.push(tokio::spawn(async move { repo.register(user_id, event_id).await }));
        }

        let mut admitted = 0;
        let mut duplicate_rejections = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(AppError::DuplicateRegistration(_)) => duplicate_rejections += 1,
                Err(other) => panic!("unexpected admission outcome: {other:?}"),
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(duplicate_rejections, 7);
        assert_eq!(count_rows(&pool, event.id).await, 1);
    }
}
