use axum::{
    routing::{get, post},
    Router,
};
use cortexbench::shared::AppState;
use cortexbench::storage::MemoryBackend;
use cortexbench::{games, leaderboard, population, scores};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cortexbench=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cortexbench gameplay server");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let backend = MemoryBackend::new();
    let app_state = AppState::new(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend),
    );

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let app_state = AppState::new(
    //     Arc::new(PostgresGameplayRepository::new(pool.clone())),
    //     Arc::new(PostgresLeaderboardRepository::new(pool.clone())),
    //     Arc::new(PostgresPopulationRepository::new(pool)),
    // );

    let app = Router::new()
        .route("/api/health", get(|| async { "ok" }))
        .route("/api/games", get(games::handlers::list_games))
        .route("/api/scores", post(scores::handlers::submit_score))
        .route(
            "/api/leaderboards/:game_slug",
            get(leaderboard::handlers::get_leaderboard),
        )
        .route(
            "/api/population/summary",
            get(population::handlers::population_summary),
        )
        .route(
            "/api/admin/recompute-population",
            post(population::handlers::recompute_population),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();
    info!("Server running on http://localhost:{}", port);
    axum::serve(listener, app).await.unwrap();
}
