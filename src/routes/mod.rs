use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, security, Config};
use crate::handlers::{self, auth, events, registrations, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
}

pub fn create_routes(pool: PgPool, config: Arc<Config>) -> Router {
    let state = AppState { pool, config };

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/token", post(auth::token))
        .route("/api/refresh", post(auth::refresh))
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/api/events/:id",
            get(events::get_event)
                .put(events::replace_event)
                .patch(events::patch_event)
                .delete(events::delete_event),
        )
        .route("/api/events/:id/register", post(events::register))
        .route("/api/my-registrations", get(registrations::my_registrations))
        .route("/api/user/create", post(users::create_user))
        .layer(middleware::from_fn(security::set_security_headers))
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
