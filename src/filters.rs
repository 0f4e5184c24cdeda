use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::models::Event;
use crate::utils::error::AppError;

const DEFAULT_PAGE_SIZE: i64 = 50;

/// Query parameters accepted by the event listing endpoint.
///
/// Every filter key is optional and typed; unrecognized keys are silently
/// ignored during deserialization. All present filters combine with AND.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EventQuery {
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub year_gte: Option<i32>,
    pub year_lte: Option<i32>,
    pub month: Option<u32>,
    pub month_gte: Option<u32>,
    pub month_lte: Option<u32>,
    pub day: Option<u32>,
    pub day_gte: Option<u32>,
    pub day_lte: Option<u32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn check_range(value: Option<u32>, name: &str, max: u32) -> Result<(), AppError> {
    match value {
        Some(v) if v < 1 || v > max => Err(AppError::ValidationError(format!(
            "'{name}' must be between 1 and {max}"
        ))),
        _ => Ok(()),
    }
}

impl EventQuery {
    /// Bounds-check the numeric date components before they are used.
    pub fn validate(&self) -> Result<(), AppError> {
        for (value, name) in [
            (self.year, "year"),
            (self.year_gte, "year_gte"),
            (self.year_lte, "year_lte"),
        ] {
            if let Some(y) = value {
                if !(1..=9999).contains(&y) {
                    return Err(AppError::ValidationError(format!(
                        "'{name}' must be between 1 and 9999"
                    )));
                }
            }
        }
        check_range(self.month, "month", 12)?;
        check_range(self.month_gte, "month_gte", 12)?;
        check_range(self.month_lte, "month_lte", 12)?;
        check_range(self.day, "day", 31)?;
        check_range(self.day_gte, "day_gte", 31)?;
        check_range(self.day_lte, "day_lte", 31)?;

        if let Some(limit) = self.limit {
            if limit < 1 {
                return Err(AppError::ValidationError(
                    "'limit' must be at least 1".to_string(),
                ));
            }
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err(AppError::ValidationError(
                    "'offset' must not be negative".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Predicate over a single event; all present filters must hold.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(category) = &self.category {
            // Case-insensitive substring match on the category slug.
            if !event
                .category
                .label()
                .contains(category.to_lowercase().as_str())
            {
                return false;
            }
        }
        if let Some(date) = self.date {
            if event.date != date {
                return false;
            }
        }

        let (year, month, day) = (event.date.year(), event.date.month(), event.date.day());

        if self.year.is_some_and(|y| year != y)
            || self.year_gte.is_some_and(|y| year < y)
            || self.year_lte.is_some_and(|y| year > y)
        {
            return false;
        }
        if self.month.is_some_and(|m| month != m)
            || self.month_gte.is_some_and(|m| month < m)
            || self.month_lte.is_some_and(|m| month > m)
        {
            return false;
        }
        if self.day.is_some_and(|d| day != d)
            || self.day_gte.is_some_and(|d| day < d)
            || self.day_lte.is_some_and(|d| day > d)
        {
            return false;
        }

        true
    }

    /// Filters first; limit/offset apply to the filtered set.
    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(0) as usize;

        events
            .into_iter()
            .filter(|e| self.matches(e))
            .skip(offset)
            .take(limit)
            .collect()
    }
}
