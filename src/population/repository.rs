use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{instrument, warn};

use super::models::PopulationAggregateRow;
use crate::shared::AppError;

/// Storage contract for the population aggregator: a full unlocked read of a
/// game's scores, the snapshot upsert, and the latest snapshot per game for
/// the summary endpoint.
#[async_trait]
pub trait PopulationRepository: Send + Sync {
    async fn scores_for_game(&self, game_slug: &str) -> Result<Vec<f64>, AppError>;
    async fn upsert_aggregate(&self, row: &PopulationAggregateRow) -> Result<(), AppError>;
    async fn latest_aggregate(
        &self,
        game_slug: &str,
    ) -> Result<Option<PopulationAggregateRow>, AppError>;
}

/// PostgreSQL implementation of the population repository
pub struct PostgresPopulationRepository {
    pool: PgPool,
}

impl PostgresPopulationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PopulationRepository for PostgresPopulationRepository {
    #[instrument(skip(self))]
    async fn scores_for_game(&self, game_slug: &str) -> Result<Vec<f64>, AppError> {
        let rows = sqlx::query("SELECT score FROM results WHERE game_slug = $1")
            .bind(game_slug)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, game_slug, "Failed to load scores for population stats");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(rows.iter().map(|row| row.get("score")).collect())
    }

    #[instrument(skip(self, row))]
    async fn upsert_aggregate(&self, row: &PopulationAggregateRow) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO population_aggregates \
               (game_slug, date, plays, mean, p25, p50, p75, min, max, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (game_slug, date) DO UPDATE SET \
               plays = EXCLUDED.plays, \
               mean = EXCLUDED.mean, \
               p25 = EXCLUDED.p25, \
               p50 = EXCLUDED.p50, \
               p75 = EXCLUDED.p75, \
               min = EXCLUDED.min, \
               max = EXCLUDED.max, \
               updated_at = EXCLUDED.updated_at",
        )
        .bind(&row.game_slug)
        .bind(row.date)
        .bind(row.plays)
        .bind(row.mean)
        .bind(row.p25)
        .bind(row.p50)
        .bind(row.p75)
        .bind(row.min)
        .bind(row.max)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, game_slug = %row.game_slug, "Failed to upsert population aggregate");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn latest_aggregate(
        &self,
        game_slug: &str,
    ) -> Result<Option<PopulationAggregateRow>, AppError> {
        let row = sqlx::query(
            "SELECT game_slug, date, plays, mean, p25, p50, p75, min, max, updated_at \
             FROM population_aggregates WHERE game_slug = $1 \
             ORDER BY date DESC LIMIT 1",
        )
        .bind(game_slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, game_slug, "Failed to fetch latest population aggregate");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|row| PopulationAggregateRow {
            game_slug: row.get("game_slug"),
            date: row.get("date"),
            plays: row.get("plays"),
            mean: row.get("mean"),
            p25: row.get("p25"),
            p50: row.get("p50"),
            p75: row.get("p75"),
            min: row.get("min"),
            max: row.get("max"),
            updated_at: row.get("updated_at"),
        }))
    }
}
