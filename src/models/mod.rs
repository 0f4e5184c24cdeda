pub mod event;
pub mod registration;
pub mod user;

pub use event::{Event, EventCategory};
pub use registration::Registration;
pub use user::User;
