use admin_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{InMemoryRepository, PostgresRepository, RepositoryState},
    seed,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point: configuration, logging, persistence, seed data and
/// the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "admin_portal=debug,tower_http=info,axum=trace".into());

    // 3. Logging format per environment: pretty locally, JSON for log aggregation in prod.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Persistence
    // Postgres when DATABASE_URL is set (always in production), otherwise an in-memory store.
    let repo: RepositoryState = match &config.db_url {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("FATAL: Failed to apply database migrations.");

            Arc::new(PostgresRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
            Arc::new(InMemoryRepository::new())
        }
    };

    // 5. Initial roles and the administrator account.
    seed::load_initial_data(&repo, &config)
        .await
        .expect("FATAL: Failed to load initial data.");

    // 6. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(repo, config).expect("FATAL: Failed to compile page templates.");

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind BIND_ADDR.");

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{bind_addr}/api/docs");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
