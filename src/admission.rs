//! Admission control for event registrations.
//!
//! The decision itself is a pure function so the capacity/duplicate ordering
//! can be pinned down in tests; the transactional plumbing that feeds it
//! lives in `repository::registration`.

use crate::utils::error::AppError;

/// Decide whether one more registration may be admitted to an event.
///
/// The capacity check runs before the duplicate check: a request that is
/// invalid on both counts reports `CapacityExceeded`.
pub fn admit(capacity: i32, registered: i64, already_registered: bool) -> Result<(), AppError> {
    if registered >= i64::from(capacity) {
        return Err(AppError::CapacityExceeded(
            "The number of registrations has reached the event's limit".to_string(),
        ));
    }
    if already_registered {
        return Err(AppError::DuplicateRegistration(
            "You are already registered for this event".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_while_below_capacity() {
        assert!(admit(2, 0, false).is_ok());
        assert!(admit(2, 1, false).is_ok());
    }

    #[test]
    fn rejects_at_capacity() {
        assert!(matches!(admit(2, 2, false), Err(AppError::CapacityExceeded(_))));
        // over-full storage still refuses
        assert!(matches!(admit(2, 3, false), Err(AppError::CapacityExceeded(_))));
    }

    #[test]
    fn rejects_duplicates() {
        assert!(matches!(
            admit(10, 3, true),
            Err(AppError::DuplicateRegistration(_))
        ));
    }

    #[test]
    fn capacity_wins_the_tie_break() {
        // Both conditions hold; capacity is reported.
        assert!(matches!(admit(1, 1, true), Err(AppError::CapacityExceeded(_))));
    }
}
