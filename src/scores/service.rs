use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::models::{
    DailyAggregateUpsert, GameplayPlan, NewResult, SubmissionPlan, SubmitScoreRequest,
    SubmitScoreResponse,
};
use super::repository::GameplayRepository;
use crate::badges::{engine, BadgeCatalog};
use crate::games::{GameCatalog, GameConfig};
use crate::scores::models::UserStatsRow;
use crate::shared::AppError;
use crate::{calendar, streak};

/// The result ingestion pipeline: the single entry point mutating gameplay
/// state.
///
/// A submission is planned from the authoritative Result history (streak
/// fields are a cache, never an input) and then committed atomically by the
/// repository. Same-user submissions are serialized through a per-user lock;
/// cross-process safety rests on the backend's atomic upserts and the badge
/// uniqueness constraint.
pub struct ScoreService {
    repository: Arc<dyn GameplayRepository>,
    games: Arc<GameCatalog>,
    badges: Arc<BadgeCatalog>,
    user_locks: Arc<RwLock<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl ScoreService {
    pub fn new(
        repository: Arc<dyn GameplayRepository>,
        games: Arc<GameCatalog>,
        badges: Arc<BadgeCatalog>,
    ) -> Self {
        Self {
            repository,
            games,
            badges,
            user_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn submit(
        &self,
        user_id: Option<Uuid>,
        request: SubmitScoreRequest,
    ) -> Result<SubmitScoreResponse, AppError> {
        if request.game_slug.is_empty() {
            return Err(AppError::Validation(
                "Missing required field: gameSlug".to_string(),
            ));
        }
        let game = self
            .games
            .get(&request.game_slug)
            .filter(|g| g.is_active)
            .ok_or_else(|| {
                AppError::InvalidGame(format!("Unknown or inactive game: {}", request.game_slug))
            })?;
        if !request.value.is_finite() {
            return Err(AppError::InvalidScore(
                "Score must be a finite number".to_string(),
            ));
        }

        let now = Utc::now();
        let result = NewResult {
            user_id,
            game_slug: game.slug.to_string(),
            score: request.value,
            duration_ms: request.duration_ms,
            metadata: request.meta.unwrap_or_else(|| serde_json::json!({})),
            created_at: now,
        };

        let outcome = match user_id {
            None => {
                // Anonymous play: record the result, touch nothing else.
                debug!(game_slug = game.slug, "Anonymous submission");
                self.repository
                    .commit_submission(&SubmissionPlan {
                        result,
                        gameplay: None,
                    })
                    .await?
            }
            Some(user_id) => {
                let lock = self.user_lock(user_id).await;
                let _guard = lock.lock().await;

                let gameplay = self.plan_gameplay(user_id, game, request.value, now).await?;
                self.repository
                    .commit_submission(&SubmissionPlan {
                        result,
                        gameplay: Some(gameplay),
                    })
                    .await?
            }
        };

        info!(
            game_slug = game.slug,
            score = outcome.result.score,
            new_badges = outcome.new_badges.len(),
            "Score submitted"
        );

        Ok(SubmitScoreResponse {
            success: true,
            score: outcome.result,
            new_badges: outcome.new_badges,
        })
    }

    /// Derives the per-user portion of the submission from the full Result
    /// history as it stands before this play, plus the play itself.
    async fn plan_gameplay(
        &self,
        user_id: Uuid,
        game: &GameConfig,
        score: f64,
        now: DateTime<Utc>,
    ) -> Result<GameplayPlan, AppError> {
        let profile = self
            .repository
            .user_profile(user_id)
            .await?
            .unwrap_or_default();

        let today = calendar::local_day(now, &profile.timezone)?;
        let prior_timestamps = self.repository.play_timestamps(user_id).await?;
        let total_sessions = prior_timestamps.len() as i64 + 1;

        let mut play_days = calendar::unique_play_days(&prior_timestamps, &profile.timezone)?;
        if let Err(position) = play_days.binary_search(&today) {
            play_days.insert(position, today);
        }

        let current_streak = streak::current_streak(&play_days, today);
        let longest_streak = streak::longest_streak(&play_days);

        let mut games_played: BTreeSet<String> =
            self.repository.games_played(user_id).await?.into_iter().collect();
        games_played.insert(game.slug.to_string());
        let game_play_count = self.repository.game_play_count(user_id, game.slug).await? + 1;

        let badge_candidates = engine::eligible_codes(
            &self.badges,
            &self.games,
            game.slug,
            &engine::BadgeEligibility {
                total_sessions,
                current_streak: current_streak as i32,
                games_played: &games_played,
                game_play_count,
            },
        );

        debug!(
            %user_id,
            total_sessions,
            current_streak,
            longest_streak,
            candidates = badge_candidates.len(),
            "Planned gameplay update"
        );

        Ok(GameplayPlan {
            stats: UserStatsRow {
                user_id,
                total_sessions,
                current_streak: current_streak as i32,
                longest_streak: longest_streak as i32,
                last_played_day: play_days.last().copied(),
                updated_at: now,
            },
            aggregate: DailyAggregateUpsert {
                user_id,
                game_slug: game.slug.to_string(),
                day: today,
                score,
                direction: game.score_direction,
            },
            badge_candidates,
        })
    }

    async fn user_lock(&self, user_id: Uuid) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.user_locks.read().await;
            if let Some(lock) = guard.get(&user_id) {
                return lock.clone();
            }
        }

        let mut guard = self.user_locks.write().await;
        guard
            .entry(user_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
