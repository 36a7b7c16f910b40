use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::{
    DailyAggregateRow, ResultRow, SubmissionOutcome, SubmissionPlan, UserProfile, UserStatsRow,
};
use crate::shared::AppError;

/// Storage contract for the result ingestion pipeline and the reads the
/// badge engine evaluates against.
///
/// `commit_submission` is the only mutating entry point: it applies the whole
/// plan (result insert, aggregate upsert, stats upsert, badge inserts) as a
/// single atomic unit, or nothing at all.
#[async_trait]
pub trait GameplayRepository: Send + Sync {
    async fn user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError>;
    async fn play_timestamps(&self, user_id: Uuid) -> Result<Vec<DateTime<Utc>>, AppError>;
    async fn games_played(&self, user_id: Uuid) -> Result<Vec<String>, AppError>;
    async fn game_play_count(&self, user_id: Uuid, game_slug: &str) -> Result<i64, AppError>;
    async fn user_stats(&self, user_id: Uuid) -> Result<Option<UserStatsRow>, AppError>;
    async fn daily_aggregate(
        &self,
        user_id: Uuid,
        game_slug: &str,
        day: NaiveDate,
    ) -> Result<Option<DailyAggregateRow>, AppError>;
    async fn badge_codes(&self, user_id: Uuid) -> Result<Vec<String>, AppError>;
    async fn commit_submission(&self, plan: &SubmissionPlan)
        -> Result<SubmissionOutcome, AppError>;
}

/// PostgreSQL implementation of the gameplay repository
pub struct PostgresGameplayRepository {
    pool: PgPool,
}

impl PostgresGameplayRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameplayRepository for PostgresGameplayRepository {
    #[instrument(skip(self))]
    async fn user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query("SELECT display_name, timezone FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, %user_id, "Failed to fetch user profile");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(row.map(|row| UserProfile {
            display_name: row.get("display_name"),
            timezone: row.get("timezone"),
        }))
    }

    #[instrument(skip(self))]
    async fn play_timestamps(&self, user_id: Uuid) -> Result<Vec<DateTime<Utc>>, AppError> {
        let rows = sqlx::query(
            "SELECT created_at FROM results WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, %user_id, "Failed to fetch play timestamps");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(rows.iter().map(|row| row.get("created_at")).collect())
    }

    #[instrument(skip(self))]
    async fn games_played(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT DISTINCT game_slug FROM results WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, %user_id, "Failed to fetch played games");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(rows.iter().map(|row| row.get("game_slug")).collect())
    }

    #[instrument(skip(self))]
    async fn game_play_count(&self, user_id: Uuid, game_slug: &str) -> Result<i64, AppError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM results WHERE user_id = $1 AND game_slug = $2",
        )
        .bind(user_id)
        .bind(game_slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, %user_id, game_slug, "Failed to count game plays");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn user_stats(&self, user_id: Uuid) -> Result<Option<UserStatsRow>, AppError> {
        let row = sqlx::query(
            "SELECT user_id, total_sessions, current_streak, longest_streak, last_played_day, updated_at \
             FROM user_stats WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, %user_id, "Failed to fetch user stats");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|row| UserStatsRow {
            user_id: row.get("user_id"),
            total_sessions: row.get("total_sessions"),
            current_streak: row.get("current_streak"),
            longest_streak: row.get("longest_streak"),
            last_played_day: row.get("last_played_day"),
            updated_at: row.get("updated_at"),
        }))
    }

    #[instrument(skip(self))]
    async fn daily_aggregate(
        &self,
        user_id: Uuid,
        game_slug: &str,
        day: NaiveDate,
    ) -> Result<Option<DailyAggregateRow>, AppError> {
        let row = sqlx::query(
            "SELECT user_id, game_slug, day_key, best_score, attempts \
             FROM daily_aggregates WHERE user_id = $1 AND game_slug = $2 AND day_key = $3",
        )
        .bind(user_id)
        .bind(game_slug)
        .bind(day)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, %user_id, game_slug, "Failed to fetch daily aggregate");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|row| DailyAggregateRow {
            user_id: row.get("user_id"),
            game_slug: row.get("game_slug"),
            day: row.get("day_key"),
            best_score: row.get("best_score"),
            attempts: row.get("attempts"),
        }))
    }

    #[instrument(skip(self))]
    async fn badge_codes(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(
            "SELECT badge_code FROM user_badges WHERE user_id = $1 ORDER BY earned_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, %user_id, "Failed to fetch user badges");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(rows.iter().map(|row| row.get("badge_code")).collect())
    }

    #[instrument(skip(self, plan))]
    async fn commit_submission(
        &self,
        plan: &SubmissionPlan,
    ) -> Result<SubmissionOutcome, AppError> {
        debug!(game_slug = %plan.result.game_slug, "Committing score submission");

        let mut tx = self.pool.begin().await.map_err(|e| {
            warn!(error = %e, "Failed to open submission transaction");
            AppError::DatabaseError(e.to_string())
        })?;

        let result_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO results (id, user_id, game_slug, score, duration_ms, metadata, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(result_id)
        .bind(plan.result.user_id)
        .bind(&plan.result.game_slug)
        .bind(plan.result.score)
        .bind(plan.result.duration_ms)
        .bind(sqlx::types::Json(&plan.result.metadata))
        .bind(plan.result.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to insert result");
            AppError::DatabaseError(e.to_string())
        })?;

        let mut new_badges = Vec::new();

        if let Some(gameplay) = &plan.gameplay {
            let agg = &gameplay.aggregate;
            // The comparison runs inside the upsert so a concurrent
            // submission cannot clobber a better score or drop an attempt.
            sqlx::query(
                "INSERT INTO daily_aggregates (user_id, game_slug, day_key, best_score, attempts) \
                 VALUES ($1, $2, $3, $4, 1) \
                 ON CONFLICT (user_id, game_slug, day_key) DO UPDATE SET \
                   attempts = daily_aggregates.attempts + 1, \
                   best_score = CASE \
                     WHEN $5 = 'HIGHER_BETTER' AND EXCLUDED.best_score > daily_aggregates.best_score \
                       THEN EXCLUDED.best_score \
                     WHEN $5 = 'LOWER_BETTER' AND EXCLUDED.best_score < daily_aggregates.best_score \
                       THEN EXCLUDED.best_score \
                     ELSE daily_aggregates.best_score \
                   END",
            )
            .bind(agg.user_id)
            .bind(&agg.game_slug)
            .bind(agg.day)
            .bind(agg.score)
            .bind(agg.direction.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to upsert daily aggregate");
                AppError::DatabaseError(e.to_string())
            })?;

            let stats = &gameplay.stats;
            // Every field, the session count included, was recomputed from
            // Result history; the stored row is a cache and never an input.
            sqlx::query(
                "INSERT INTO user_stats (user_id, total_sessions, current_streak, longest_streak, last_played_day, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (user_id) DO UPDATE SET \
                   total_sessions = EXCLUDED.total_sessions, \
                   current_streak = EXCLUDED.current_streak, \
                   longest_streak = EXCLUDED.longest_streak, \
                   last_played_day = EXCLUDED.last_played_day, \
                   updated_at = EXCLUDED.updated_at",
            )
            .bind(stats.user_id)
            .bind(stats.total_sessions)
            .bind(stats.current_streak)
            .bind(stats.longest_streak)
            .bind(stats.last_played_day)
            .bind(stats.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to upsert user stats");
                AppError::DatabaseError(e.to_string())
            })?;

            for code in &gameplay.badge_candidates {
                // Unique constraint on (user_id, badge_code); a concurrent
                // duplicate award degrades to a no-op instead of an error.
                let inserted = sqlx::query(
                    "INSERT INTO user_badges (user_id, badge_code, earned_at) \
                     VALUES ($1, $2, $3) ON CONFLICT (user_id, badge_code) DO NOTHING",
                )
                .bind(stats.user_id)
                .bind(code)
                .bind(plan.result.created_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    warn!(error = %e, badge = %code, "Failed to insert user badge");
                    AppError::DatabaseError(e.to_string())
                })?;

                if inserted.rows_affected() == 1 {
                    new_badges.push(code.clone());
                }
            }
        }

        tx.commit().await.map_err(|e| {
            warn!(error = %e, "Failed to commit submission transaction");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(%result_id, new_badges = new_badges.len(), "Submission committed");

        Ok(SubmissionOutcome {
            result: ResultRow {
                id: result_id,
                user_id: plan.result.user_id,
                game_slug: plan.result.game_slug.clone(),
                score: plan.result.score,
                duration_ms: plan.result.duration_ms,
                metadata: plan.result.metadata.clone(),
                created_at: plan.result.created_at,
            },
            new_badges,
        })
    }
}
