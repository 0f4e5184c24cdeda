use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use eventos_server::auth;
use eventos_server::config::Config;
use eventos_server::repository::UserRepository;
use eventos_server::routes::create_routes;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Arc::new(Config::from_env());
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let hash = auth::hash_password(password).expect("Failed to hash admin password");
        UserRepository::new(pool.clone())
            .upsert_admin(username, &hash)
            .await
            .expect("Failed to provision admin user");
        tracing::info!(%username, "Bootstrap admin provisioned");
    }

    let app = create_routes(pool, config.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
