use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::models::GamePopulationSummary;
use super::service::PopulationService;
use crate::shared::{AppError, AppState};

/// HTTP handler for the population summary
///
/// GET /api/population/summary
/// Returns the latest snapshot per active game
#[instrument(name = "population_summary", skip(state))]
pub async fn population_summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<GamePopulationSummary>>, AppError> {
    let service = PopulationService::new(
        Arc::clone(&state.population_repository),
        Arc::clone(&state.games),
    );
    let summaries = service.summary().await?;
    Ok(Json(summaries))
}

/// HTTP handler for the admin recompute trigger
///
/// POST /api/admin/recompute-population
/// Guarded by the x-admin-secret header; runs the aggregator synchronously
#[instrument(name = "recompute_population", skip(state, headers))]
pub async fn recompute_population(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let secret = headers
        .get("x-admin-secret")
        .and_then(|value| value.to_str().ok());
    if secret != Some(state.admin_secret.as_str()) {
        warn!("Rejected population recompute with bad admin secret");
        return Err(AppError::Unauthorized("Invalid admin secret".to_string()));
    }

    let service = PopulationService::new(
        Arc::clone(&state.population_repository),
        Arc::clone(&state.games),
    );
    let summary = service.recompute(Utc::now().date_naive()).await?;

    info!(processed = summary.processed, "Population recompute finished");

    Ok(Json(json!({ "processed": summary.processed })))
}
