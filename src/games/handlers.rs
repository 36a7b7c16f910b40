use axum::{extract::State, Json};
use tracing::instrument;

use super::GameConfig;
use crate::shared::AppState;

/// HTTP handler for the game catalog
///
/// GET /api/games
/// Returns the active game catalog for client display
#[instrument(name = "list_games", skip(state))]
pub async fn list_games(State(state): State<AppState>) -> Json<Vec<GameConfig>> {
    let games: Vec<GameConfig> = state.games.active().cloned().collect();
    Json(games)
}
