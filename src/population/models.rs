use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One population snapshot per (game, calendar date). Fully recomputable
/// from Result history; a rerun on the same date overwrites the row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationAggregateRow {
    pub game_slug: String,
    pub date: NaiveDate,
    pub plays: i64,
    pub mean: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub min: f64,
    pub max: f64,
    pub updated_at: DateTime<Utc>,
}

/// Wire shape for GET /api/population/summary: the latest snapshot per
/// active game, zeroed when a game has no data yet.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePopulationSummary {
    pub game_slug: String,
    pub plays: i64,
    pub mean: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub min: f64,
    pub max: f64,
    pub updated_at: Option<DateTime<Utc>>,
    pub has_data: bool,
}

/// Outcome of one recompute run.
#[derive(Debug, Serialize)]
pub struct RecomputeSummary {
    pub processed: usize,
}
