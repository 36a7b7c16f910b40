//! In-memory storage backend for development and testing.
//!
//! One shared state behind a single lock implements every repository trait,
//! so the ingestion commit is atomic by construction: a write-lock scope
//! either applies the whole submission plan or none of it. Data is lost on
//! restart.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::games::{is_better_score, ScoreDirection};
use crate::leaderboard::repository::{LeaderboardEntryRow, LeaderboardRepository};
use crate::population::models::PopulationAggregateRow;
use crate::population::repository::PopulationRepository;
use crate::scores::models::{
    DailyAggregateRow, ResultRow, SubmissionOutcome, SubmissionPlan, UserProfile, UserStatsRow,
};
use crate::scores::repository::GameplayRepository;
use crate::shared::AppError;

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, UserProfile>,
    results: Vec<ResultRow>,
    daily_aggregates: HashMap<(Uuid, String, NaiveDate), DailyAggregateRow>,
    user_stats: HashMap<Uuid, UserStatsRow>,
    user_badges: HashMap<Uuid, Vec<(String, DateTime<Utc>)>>,
    population: HashMap<(String, NaiveDate), PopulationAggregateRow>,
}

/// Shared in-memory store. Cloning yields another handle onto the same
/// state, which is how one backend serves all three repository roles.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a user with the given display name and timezone, returning
    /// the generated id.
    pub fn register_user(&self, display_name: &str, timezone: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.write().unwrap().users.insert(
            id,
            UserProfile {
                display_name: Some(display_name.to_string()),
                timezone: timezone.to_string(),
            },
        );
        id
    }

    /// Inserts a result row directly, bypassing the ingestion pipeline.
    /// Test seeding only: aggregates and stats are deliberately untouched.
    pub fn seed_result(
        &self,
        user_id: Option<Uuid>,
        game_slug: &str,
        score: f64,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.state.write().unwrap().results.push(ResultRow {
            id,
            user_id,
            game_slug: game_slug.to_string(),
            score,
            duration_ms: None,
            metadata: serde_json::json!({}),
            created_at,
        });
        id
    }

    pub fn result_count(&self) -> usize {
        self.state.read().unwrap().results.len()
    }

    pub fn population_row_count(&self) -> usize {
        self.state.read().unwrap().population.len()
    }
}

#[async_trait]
impl GameplayRepository for MemoryBackend {
    async fn user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(self.state.read().unwrap().users.get(&user_id).cloned())
    }

    async fn play_timestamps(&self, user_id: Uuid) -> Result<Vec<DateTime<Utc>>, AppError> {
        let state = self.state.read().unwrap();
        let mut timestamps: Vec<DateTime<Utc>> = state
            .results
            .iter()
            .filter(|r| r.user_id == Some(user_id))
            .map(|r| r.created_at)
            .collect();
        timestamps.sort();
        Ok(timestamps)
    }

    async fn games_played(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let state = self.state.read().unwrap();
        let mut slugs: Vec<String> = state
            .results
            .iter()
            .filter(|r| r.user_id == Some(user_id))
            .map(|r| r.game_slug.clone())
            .collect();
        slugs.sort();
        slugs.dedup();
        Ok(slugs)
    }

    async fn game_play_count(&self, user_id: Uuid, game_slug: &str) -> Result<i64, AppError> {
        let state = self.state.read().unwrap();
        Ok(state
            .results
            .iter()
            .filter(|r| r.user_id == Some(user_id) && r.game_slug == game_slug)
            .count() as i64)
    }

    async fn user_stats(&self, user_id: Uuid) -> Result<Option<UserStatsRow>, AppError> {
        Ok(self.state.read().unwrap().user_stats.get(&user_id).cloned())
    }

    async fn daily_aggregate(
        &self,
        user_id: Uuid,
        game_slug: &str,
        day: NaiveDate,
    ) -> Result<Option<DailyAggregateRow>, AppError> {
        let key = (user_id, game_slug.to_string(), day);
        Ok(self.state.read().unwrap().daily_aggregates.get(&key).cloned())
    }

    async fn badge_codes(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let state = self.state.read().unwrap();
        Ok(state
            .user_badges
            .get(&user_id)
            .map(|badges| badges.iter().map(|(code, _)| code.clone()).collect())
            .unwrap_or_default())
    }

    #[instrument(skip(self, plan))]
    async fn commit_submission(
        &self,
        plan: &SubmissionPlan,
    ) -> Result<SubmissionOutcome, AppError> {
        // Single write-lock scope: the whole plan lands or none of it does.
        let mut state = self.state.write().unwrap();

        let result = ResultRow {
            id: Uuid::new_v4(),
            user_id: plan.result.user_id,
            game_slug: plan.result.game_slug.clone(),
            score: plan.result.score,
            duration_ms: plan.result.duration_ms,
            metadata: plan.result.metadata.clone(),
            created_at: plan.result.created_at,
        };
        state.results.push(result.clone());

        let mut new_badges = Vec::new();

        if let Some(gameplay) = &plan.gameplay {
            let agg = &gameplay.aggregate;
            let key = (agg.user_id, agg.game_slug.clone(), agg.day);
            state
                .daily_aggregates
                .entry(key)
                .and_modify(|existing| {
                    existing.attempts += 1;
                    if is_better_score(agg.score, existing.best_score, agg.direction) {
                        existing.best_score = agg.score;
                    }
                })
                .or_insert_with(|| DailyAggregateRow {
                    user_id: agg.user_id,
                    game_slug: agg.game_slug.clone(),
                    day: agg.day,
                    best_score: agg.score,
                    attempts: 1,
                });

            // The stats row is a cache recomputed from Result history, so the
            // plan's values replace it wholesale.
            let stats = gameplay.stats.clone();
            state.user_stats.insert(stats.user_id, stats);

            let owned = state
                .user_badges
                .entry(gameplay.stats.user_id)
                .or_default();
            for code in &gameplay.badge_candidates {
                if owned.iter().any(|(existing, _)| existing == code) {
                    continue;
                }
                owned.push((code.clone(), plan.result.created_at));
                new_badges.push(code.clone());
            }
        }

        debug!(
            game_slug = %plan.result.game_slug,
            new_badges = new_badges.len(),
            "Submission committed to memory"
        );

        Ok(SubmissionOutcome { result, new_badges })
    }
}

#[async_trait]
impl LeaderboardRepository for MemoryBackend {
    async fn best_per_user(
        &self,
        game_slug: &str,
        direction: ScoreDirection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntryRow>, AppError> {
        let state = self.state.read().unwrap();

        // Best score per user; on a tie the more recent achievement wins.
        let mut best: HashMap<Uuid, (f64, DateTime<Utc>)> = HashMap::new();
        for result in state.results.iter().filter(|r| r.game_slug == game_slug) {
            let Some(user_id) = result.user_id else {
                continue;
            };
            best.entry(user_id)
                .and_modify(|(score, achieved_at)| {
                    let better = is_better_score(result.score, *score, direction);
                    let tie_newer = result.score == *score && result.created_at > *achieved_at;
                    if better || tie_newer {
                        *score = result.score;
                        *achieved_at = result.created_at;
                    }
                })
                .or_insert((result.score, result.created_at));
        }

        let mut entries: Vec<LeaderboardEntryRow> = best
            .into_iter()
            .map(|(user_id, (score, created_at))| LeaderboardEntryRow {
                user_id,
                display_name: state
                    .users
                    .get(&user_id)
                    .and_then(|u| u.display_name.clone()),
                score,
                created_at,
            })
            .collect();

        entries.sort_by(|a, b| {
            let ordering = a
                .score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal);
            match direction {
                ScoreDirection::HigherBetter => ordering.reverse(),
                ScoreDirection::LowerBetter => ordering,
            }
        });

        Ok(entries
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn contributor_count(&self, game_slug: &str) -> Result<i64, AppError> {
        let state = self.state.read().unwrap();
        let mut users: Vec<Uuid> = state
            .results
            .iter()
            .filter(|r| r.game_slug == game_slug)
            .filter_map(|r| r.user_id)
            .collect();
        users.sort();
        users.dedup();
        Ok(users.len() as i64)
    }
}

#[async_trait]
impl PopulationRepository for MemoryBackend {
    async fn scores_for_game(&self, game_slug: &str) -> Result<Vec<f64>, AppError> {
        let state = self.state.read().unwrap();
        Ok(state
            .results
            .iter()
            .filter(|r| r.game_slug == game_slug)
            .map(|r| r.score)
            .collect())
    }

    async fn upsert_aggregate(&self, row: &PopulationAggregateRow) -> Result<(), AppError> {
        let mut state = self.state.write().unwrap();
        state
            .population
            .insert((row.game_slug.clone(), row.date), row.clone());
        Ok(())
    }

    async fn latest_aggregate(
        &self,
        game_slug: &str,
    ) -> Result<Option<PopulationAggregateRow>, AppError> {
        let state = self.state.read().unwrap();
        Ok(state
            .population
            .values()
            .filter(|row| row.game_slug == game_slug)
            .max_by_key(|row| row.date)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn seeded_results_are_visible_to_reads() {
        let backend = MemoryBackend::new();
        let user = backend.register_user("test-user", "UTC");
        let now = Utc::now();

        backend.seed_result(Some(user), "reaction-time", 300.0, now - Duration::days(1));
        backend.seed_result(Some(user), "chimp-test", 9.0, now);
        backend.seed_result(None, "chimp-test", 4.0, now);

        assert_eq!(backend.play_timestamps(user).await.unwrap().len(), 2);
        assert_eq!(
            backend.games_played(user).await.unwrap(),
            vec!["chimp-test".to_string(), "reaction-time".to_string()]
        );
        assert_eq!(
            backend.game_play_count(user, "chimp-test").await.unwrap(),
            1
        );
        assert_eq!(backend.result_count(), 3);
    }

    #[tokio::test]
    async fn tie_on_best_score_keeps_most_recent_achievement() {
        let backend = MemoryBackend::new();
        let user = backend.register_user("tied", "UTC");
        let earlier = Utc::now() - Duration::hours(2);
        let later = Utc::now();

        backend.seed_result(Some(user), "typing-test", 70.0, earlier);
        backend.seed_result(Some(user), "typing-test", 70.0, later);

        let rows = LeaderboardRepository::best_per_user(
            &backend,
            "typing-test",
            ScoreDirection::HigherBetter,
            10,
            0,
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].created_at, later);
    }
}
