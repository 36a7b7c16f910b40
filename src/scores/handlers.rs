use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::instrument;

use super::models::{SubmitScoreRequest, SubmitScoreResponse};
use crate::auth;
use crate::shared::{AppError, AppState};

/// HTTP handler for score submission
///
/// POST /api/scores
/// Identity is optional: a valid bearer token attributes the play to that
/// user, anything else records an anonymous result. Body deserialization
/// failures surface as validation errors with the standard JSON shape.
#[instrument(name = "submit_score", skip(state, headers, payload))]
pub async fn submit_score(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SubmitScoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitScoreResponse>), AppError> {
    let Json(request) = payload?;
    let user_id = auth::resolve_user_id(&headers, &state.token_config);
    let response = state.score_service.submit(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
