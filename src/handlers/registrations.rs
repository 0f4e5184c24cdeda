use axum::extract::State;
use axum::response::Response;

use crate::auth::CurrentUser;
use crate::repository::RegistrationRepository;
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// Zero registrations for an authenticated caller is a 404, not an empty
/// list. Inherited API contract; clients depend on it.
pub async fn my_registrations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let registrations = RegistrationRepository::new(state.pool.clone())
        .list_for_user(user.id)
        .await?;

    if registrations.is_empty() {
        return Err(AppError::NotFound("No registrations".to_string()));
    }
    Ok(success(registrations, "Registrations retrieved"))
}
