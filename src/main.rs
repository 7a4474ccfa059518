use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use attendance_server::config::Config;
use attendance_server::db::Store;
use attendance_server::routes::create_routes;
use attendance_server::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    if config.uses_default_secret() {
        tracing::warn!("SECRET_KEY is not set; using the insecure development key");
    }

    let store = Store::connect(&config.database_url).expect("Invalid DATABASE_URL");

    // A sleeping database must not keep the server from starting.
    match store.migrate().await {
        Ok(()) => tracing::info!("Migrations run successfully"),
        Err(e) => tracing::warn!(error = %e, "Could not run migrations, continuing startup"),
    }

    let app = create_routes(AppState::new(store, &config), &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
