pub mod event;
pub mod registration;
pub mod user;

pub use event::EventRepository;
pub use registration::RegistrationRepository;
pub use user::UserRepository;

/// True when `err` is a violation of the named unique constraint.
pub(crate) fn unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.constraint() == Some(constraint),
        _ => false,
    }
}
