use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::MaybeUser;
use crate::filters::EventQuery;
use crate::models::{Event, EventCategory};
use crate::permissions::{Action, AuthenticatedOrReadOnly, OwnerOrReadOnly, Policy};
use crate::repository::{EventRepository, RegistrationRepository};
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::ApiQuery;
use crate::utils::response::{created, no_content, success};

const MAX_TITLE_LEN: usize = 50;
const MAX_LOCATION_LEN: usize = 50;
const MAX_CAPACITY: i32 = 10_000;

/// Full event payload, used for creation and PUT.
#[derive(Debug, Deserialize)]
pub struct EventBody {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub capacity: i32,
    pub category: EventCategory,
}

impl EventBody {
    fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_location(&self.location)?;
        validate_capacity(self.capacity)
    }
}

/// Partial payload for PATCH; absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub category: Option<EventCategory>,
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::ValidationError(
            "'title' must not be empty".to_string(),
        ));
    }
    // Character count, not byte length: the column is VARCHAR(50).
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::ValidationError(format!(
            "'title' must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_location(location: &str) -> Result<(), AppError> {
    if location.chars().count() > MAX_LOCATION_LEN {
        return Err(AppError::ValidationError(format!(
            "'location' must be at most {MAX_LOCATION_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_capacity(capacity: i32) -> Result<(), AppError> {
    if !(1..=MAX_CAPACITY).contains(&capacity) {
        return Err(AppError::ValidationError(format!(
            "'capacity' must be between 1 and {MAX_CAPACITY}"
        )));
    }
    Ok(())
}

pub async fn list_events(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EventQuery>,
) -> Result<Response, AppError> {
    query.validate()?;

    let events = EventRepository::new(state.pool.clone()).list().await?;
    let page = query.apply(events);

    if page.is_empty() {
        return Ok(no_content());
    }
    Ok(success(page, "Events retrieved"))
}

pub async fn create_event(
    State(state): State<AppState>,
    MaybeUser(identity): MaybeUser,
    Json(body): Json<EventBody>,
) -> Result<Response, AppError> {
    AuthenticatedOrReadOnly
        .authorize(identity.as_ref(), Action::Write, None)
        .into_result()?;
    // The policy guarantees an identity on the write path.
    let creator = identity.ok_or_else(|| {
        AppError::InternalServerError("Missing identity after authorization".to_string())
    })?;

    body.validate()?;

    let repo = EventRepository::new(state.pool.clone());
    if repo
        .slot_taken(&body.title, body.date, body.time, None)
        .await?
    {
        return Err(AppError::ValidationError(
            "An event with this title, date and time already exists".to_string(),
        ));
    }

    let now = Utc::now();
    let event = Event {
        id: Uuid::new_v4(),
        title: body.title,
        description: body.description,
        date: body.date,
        time: body.time,
        location: body.location,
        capacity: body.capacity,
        category: body.category,
        creator_id: creator.id,
        created_at: now,
        updated_at: now,
    };
    repo.insert(&event).await?;

    Ok(created(event, "Event created"))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = EventRepository::new(state.pool.clone())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    Ok(success(event, "Event retrieved"))
}

pub async fn replace_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeUser(identity): MaybeUser,
    Json(body): Json<EventBody>,
) -> Result<Response, AppError> {
    let repo = EventRepository::new(state.pool.clone());
    let mut event = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    OwnerOrReadOnly
        .authorize(identity.as_ref(), Action::Write, Some(event.creator_id))
        .into_result()?;
    body.validate()?;

    if repo
        .slot_taken(&body.title, body.date, body.time, Some(id))
        .await?
    {
        return Err(AppError::ValidationError(
            "An event with this title, date and time already exists".to_string(),
        ));
    }

    event.title = body.title;
    event.description = body.description;
    event.date = body.date;
    event.time = body.time;
    event.location = body.location;
    event.capacity = body.capacity;
    event.category = body.category;
    event.updated_at = Utc::now();
    repo.update(&event).await?;

    Ok(success(event, "Event updated"))
}

pub async fn patch_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeUser(identity): MaybeUser,
    Json(patch): Json<EventPatch>,
) -> Result<Response, AppError> {
    let repo = EventRepository::new(state.pool.clone());
    let mut event = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    OwnerOrReadOnly
        .authorize(identity.as_ref(), Action::Write, Some(event.creator_id))
        .into_result()?;

    if let Some(title) = patch.title {
        validate_title(&title)?;
        event.title = title;
    }
    if let Some(description) = patch.description {
        event.description = description;
    }
    if let Some(date) = patch.date {
        event.date = date;
    }
    if let Some(time) = patch.time {
        event.time = time;
    }
    if let Some(location) = patch.location {
        validate_location(&location)?;
        event.location = location;
    }
    if let Some(capacity) = patch.capacity {
        validate_capacity(capacity)?;
        event.capacity = capacity;
    }
    if let Some(category) = patch.category {
        event.category = category;
    }

    if repo
        .slot_taken(&event.title, event.date, event.time, Some(id))
        .await?
    {
        return Err(AppError::ValidationError(
            "An event with this title, date and time already exists".to_string(),
        ));
    }
    event.updated_at = Utc::now();
    repo.update(&event).await?;

    Ok(success(event, "Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeUser(identity): MaybeUser,
) -> Result<Response, AppError> {
    let repo = EventRepository::new(state.pool.clone());
    let event = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    OwnerOrReadOnly
        .authorize(identity.as_ref(), Action::Write, Some(event.creator_id))
        .into_result()?;

    repo.delete(id).await?;
    Ok(no_content())
}

pub async fn register(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeUser(identity): MaybeUser,
) -> Result<Response, AppError> {
    AuthenticatedOrReadOnly
        .authorize(identity.as_ref(), Action::Write, None)
        .into_result()?;
    let user = identity.ok_or_else(|| {
        AppError::InternalServerError("Missing identity after authorization".to_string())
    })?;

    let registration = RegistrationRepository::new(state.pool.clone())
        .register(user.id, id)
        .await?;

    Ok(created(registration, "Registered for event"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(title: &str, location: &str, capacity: i32) -> EventBody {
        EventBody {
            title: title.to_string(),
            description: "annual meetup".to_string(),
            date: "2025-06-13".parse().unwrap(),
            time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            location: location.to_string(),
            capacity,
            category: EventCategory::Tecnologia,
        }
    }

    #[test]
    fn overlong_location_is_a_validation_error() {
        let long = "x".repeat(51);
        assert!(matches!(
            body("Rustconf", &long, 10).validate(),
            Err(AppError::ValidationError(_))
        ));
        assert!(body("Rustconf", &"x".repeat(50), 10).validate().is_ok());
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        // 50 two-byte characters fit in a VARCHAR(50) column.
        let title = "á".repeat(50);
        assert!(validate_title(&title).is_ok());
        assert!(validate_title(&"á".repeat(51)).is_err());

        let location = "ã".repeat(50);
        assert!(validate_location(&location).is_ok());
        assert!(validate_location(&"ã".repeat(51)).is_err());
    }

    #[test]
    fn capacity_bounds() {
        assert!(body("Rustconf", "Sala 3", 0).validate().is_err());
        assert!(body("Rustconf", "Sala 3", 10_001).validate().is_err());
        assert!(body("Rustconf", "Sala 3", 1).validate().is_ok());
        assert!(body("Rustconf", "Sala 3", 10_000).validate().is_ok());
    }
}
