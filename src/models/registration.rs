use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    /// Assigned when the registration is admitted; never updated afterwards.
    pub registration_date: NaiveDate,
}
