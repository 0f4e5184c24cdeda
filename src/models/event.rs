use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fixed category set, stored as the `event_category` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Tecnologia,
    Educacao,
    Saude,
    Empreendedorismo,
}

impl EventCategory {
    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Tecnologia => "tecnologia",
            EventCategory::Educacao => "educacao",
            EventCategory::Saude => "saude",
            EventCategory::Empreendedorismo => "empreendedorismo",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub capacity: i32,
    pub category: EventCategory,
    /// Set once at creation, never writable by clients.
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_to_slug() {
        let json = serde_json::to_string(&EventCategory::Empreendedorismo).unwrap();
        assert_eq!(json, "\"empreendedorismo\"");

        let back: EventCategory = serde_json::from_str("\"tecnologia\"").unwrap();
        assert_eq!(back, EventCategory::Tecnologia);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let res: Result<EventCategory, _> = serde_json::from_str("\"esportes\"");
        assert!(res.is_err());
    }
}
