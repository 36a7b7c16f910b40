use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::games::ScoreDirection;
use crate::shared::AppError;

/// One user's single best score for a game, with the moment it was achieved.
#[derive(Debug, Clone)]
pub struct LeaderboardEntryRow {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

/// Read-only aggregation contract the leaderboard needs from storage:
/// best score per user (anonymous results excluded) and the distinct
/// contributor count for pagination.
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    async fn best_per_user(
        &self,
        game_slug: &str,
        direction: ScoreDirection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntryRow>, AppError>;

    async fn contributor_count(&self, game_slug: &str) -> Result<i64, AppError>;
}

/// PostgreSQL implementation of the leaderboard repository
pub struct PostgresLeaderboardRepository {
    pool: PgPool,
}

impl PostgresLeaderboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaderboardRepository for PostgresLeaderboardRepository {
    #[instrument(skip(self))]
    async fn best_per_user(
        &self,
        game_slug: &str,
        direction: ScoreDirection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntryRow>, AppError> {
        // DISTINCT ON picks exactly one row per user: their best score for
        // the game, tie-broken by most recent achievement. Only the sort
        // keyword varies by direction, never user input.
        let score_order = match direction {
            ScoreDirection::HigherBetter => "DESC",
            ScoreDirection::LowerBetter => "ASC",
        };
        let sql = format!(
            "WITH best_scores AS ( \
               SELECT DISTINCT ON (user_id) user_id, score, created_at \
               FROM results \
               WHERE game_slug = $1 AND user_id IS NOT NULL \
               ORDER BY user_id, score {score_order}, created_at DESC \
             ) \
             SELECT bs.user_id, bs.score, bs.created_at, u.display_name \
             FROM best_scores bs \
             JOIN users u ON u.id = bs.user_id \
             ORDER BY bs.score {score_order} \
             LIMIT $2 OFFSET $3"
        );

        let rows = sqlx::query(&sql)
            .bind(game_slug)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, game_slug, "Failed to fetch leaderboard page");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(rows
            .iter()
            .map(|row| LeaderboardEntryRow {
                user_id: row.get("user_id"),
                display_name: row.get("display_name"),
                score: row.get("score"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn contributor_count(&self, game_slug: &str) -> Result<i64, AppError> {
        sqlx::query_scalar(
            "SELECT COUNT(DISTINCT user_id) FROM results \
             WHERE game_slug = $1 AND user_id IS NOT NULL",
        )
        .bind(game_slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, game_slug, "Failed to count leaderboard contributors");
            AppError::DatabaseError(e.to_string())
        })
    }
}
