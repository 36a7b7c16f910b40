use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::TokenConfig;
use crate::badges::BadgeCatalog;
use crate::games::GameCatalog;
use crate::leaderboard::repository::LeaderboardRepository;
use crate::population::repository::PopulationRepository;
use crate::scores::repository::GameplayRepository;
use crate::scores::service::ScoreService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub gameplay_repository: Arc<dyn GameplayRepository>,
    pub leaderboard_repository: Arc<dyn LeaderboardRepository>,
    pub population_repository: Arc<dyn PopulationRepository>,
    pub score_service: Arc<ScoreService>,
    pub games: Arc<GameCatalog>,
    pub badges: Arc<BadgeCatalog>,
    pub token_config: TokenConfig,
    pub admin_secret: String,
}

impl AppState {
    pub fn new(
        gameplay_repository: Arc<dyn GameplayRepository>,
        leaderboard_repository: Arc<dyn LeaderboardRepository>,
        population_repository: Arc<dyn PopulationRepository>,
    ) -> Self {
        let games = Arc::new(GameCatalog::standard());
        let badges = Arc::new(BadgeCatalog::standard(&games));
        let score_service = Arc::new(ScoreService::new(
            Arc::clone(&gameplay_repository),
            Arc::clone(&games),
            Arc::clone(&badges),
        ));

        Self {
            gameplay_repository,
            leaderboard_repository,
            population_repository,
            score_service,
            games,
            badges,
            token_config: TokenConfig::new(),
            admin_secret: std::env::var("ADMIN_SECRET")
                .unwrap_or_else(|_| "temp_dev_secret".to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid game: {0}")]
    InvalidGame(String),

    #[error("Invalid score: {0}")]
    InvalidScore(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unresolvable timezone: {0}")]
    Timezone(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Stable machine-readable code included in every error response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "invalid_request",
            AppError::InvalidGame(_) => "invalid_game",
            AppError::InvalidScore(_) => "invalid_score",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::Timezone(_) => "invalid_timezone",
            AppError::DatabaseError(_) => "storage_error",
            AppError::Internal => "internal_error",
        }
    }
}

// A malformed or incomplete request body is a validation failure like any
// other, so it carries the same JSON error shape instead of axum's
// plain-text rejection.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidGame(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidScore(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Timezone(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Unresolvable timezone: {}", msg),
            ),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
