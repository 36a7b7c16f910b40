use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::service::{LeaderboardPage, LeaderboardService};
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// HTTP handler for the per-game leaderboard
///
/// GET /api/leaderboards/:game_slug?page=&limit=
/// Returns ranked best-score-per-user entries with pagination metadata
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(game_slug): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardPage>, AppError> {
    info!(game_slug = %game_slug, "Loading leaderboard");

    let service = LeaderboardService::new(
        Arc::clone(&state.leaderboard_repository),
        Arc::clone(&state.games),
    );
    let page = service.page(&game_slug, query.page, query.limit).await?;

    info!(
        game_slug = %game_slug,
        entries = page.leaderboard.len(),
        total = page.pagination.total,
        "Leaderboard loaded"
    );

    Ok(Json(page))
}
