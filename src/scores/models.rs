use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::games::ScoreDirection;

/// One persisted game play. Append-only: never updated or deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub game_slug: String,
    pub score: f64,
    pub duration_ms: Option<f64>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A result waiting to be persisted. `created_at` is fixed up front so the
/// stored row and the day-key derivation see the same instant.
#[derive(Debug, Clone)]
pub struct NewResult {
    pub user_id: Option<Uuid>,
    pub game_slug: String,
    pub score: f64,
    pub duration_ms: Option<f64>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Minimal user record the core needs: identity resolution happens
/// elsewhere, this is just timezone and display data.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub timezone: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            display_name: None,
            timezone: "UTC".to_string(),
        }
    }
}

/// Derived per-user counters. A cache over Result history: every field is
/// recomputed from the full history inside the ingestion commit, never
/// trusted as an input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsRow {
    pub user_id: Uuid,
    pub total_sessions: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_played_day: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// Per (user, game, local day) best score and attempt count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregateRow {
    pub user_id: Uuid,
    pub game_slug: String,
    pub day: NaiveDate,
    pub best_score: f64,
    pub attempts: i64,
}

/// Input to the atomic daily-aggregate upsert. The "is better" comparison is
/// evaluated inside the storage backend so concurrent submissions cannot
/// lose a best-score update.
#[derive(Debug, Clone)]
pub struct DailyAggregateUpsert {
    pub user_id: Uuid,
    pub game_slug: String,
    pub day: NaiveDate,
    pub score: f64,
    pub direction: ScoreDirection,
}

/// The per-user portion of a submission: recomputed stats, the aggregate
/// upsert, and the badge codes the user now qualifies for.
#[derive(Debug, Clone)]
pub struct GameplayPlan {
    pub stats: UserStatsRow,
    pub aggregate: DailyAggregateUpsert,
    pub badge_candidates: Vec<String>,
}

/// Everything one score submission writes, committed as a single atomic
/// unit. `gameplay` is None for anonymous plays.
#[derive(Debug, Clone)]
pub struct SubmissionPlan {
    pub result: NewResult,
    pub gameplay: Option<GameplayPlan>,
}

/// What the commit actually did: the persisted row plus the badges that were
/// newly inserted (candidates already owned are silently skipped).
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub result: ResultRow,
    pub new_badges: Vec<String>,
}

/// Wire request for POST /api/scores.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    pub game_slug: String,
    pub value: f64,
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

/// Wire response for POST /api/scores.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreResponse {
    pub success: bool,
    pub score: ResultRow,
    pub new_badges: Vec<String>,
}
