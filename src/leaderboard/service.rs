use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::repository::LeaderboardRepository;
use crate::games::GameCatalog;
use crate::shared::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// One ranked leaderboard line. Ranks are 1-based and dense across pages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: Uuid,
    pub display_name: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardGameInfo {
    pub slug: String,
    pub name: String,
    pub score_unit: String,
    pub score_direction: crate::games::ScoreDirection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPage {
    pub game: LeaderboardGameInfo,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub pagination: LeaderboardPagination,
}

/// Service for the read-only per-game leaderboard
pub struct LeaderboardService {
    repository: Arc<dyn LeaderboardRepository>,
    games: Arc<GameCatalog>,
}

impl LeaderboardService {
    pub fn new(repository: Arc<dyn LeaderboardRepository>, games: Arc<GameCatalog>) -> Self {
        Self { repository, games }
    }

    /// One entry per user, best score per the game's direction, offset
    /// pagination with the page size capped at `MAX_PAGE_SIZE`.
    #[instrument(skip(self))]
    pub async fn page(
        &self,
        game_slug: &str,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<LeaderboardPage, AppError> {
        let game = self
            .games
            .get(game_slug)
            .filter(|g| g.is_active)
            .ok_or_else(|| AppError::InvalidGame(format!("Unknown game: {game_slug}")))?;

        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * limit;

        let rows = self
            .repository
            .best_per_user(game_slug, game.score_direction, limit, offset)
            .await?;
        let total = self.repository.contributor_count(game_slug).await?;
        let has_more = offset + (rows.len() as i64) < total;

        debug!(game_slug, page, limit, total, "Leaderboard page loaded");

        let leaderboard = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| LeaderboardEntry {
                rank: offset + index as i64 + 1,
                user_id: row.user_id,
                display_name: row
                    .display_name
                    .unwrap_or_else(|| "Anonymous".to_string()),
                score: row.score,
                created_at: row.created_at,
            })
            .collect();

        Ok(LeaderboardPage {
            game: LeaderboardGameInfo {
                slug: game.slug.to_string(),
                name: game.name.to_string(),
                score_unit: game.score_unit.to_string(),
                score_direction: game.score_direction,
            },
            leaderboard,
            pagination: LeaderboardPagination {
                page,
                limit,
                total,
                has_more,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryBackend;
    use chrono::{Duration, Utc};

    fn service(backend: &MemoryBackend) -> LeaderboardService {
        LeaderboardService::new(
            Arc::new(backend.clone()),
            Arc::new(GameCatalog::standard()),
        )
    }

    #[tokio::test]
    async fn one_entry_per_user_with_true_best() {
        let backend = MemoryBackend::new();
        let alice = backend.register_user("Alice", "UTC");
        let bob = backend.register_user("Bob", "UTC");
        let now = Utc::now();

        // reaction-time is LOWER_BETTER: Alice's best is 210, Bob's is 250
        backend.seed_result(Some(alice), "reaction-time", 300.0, now - Duration::hours(3));
        backend.seed_result(Some(alice), "reaction-time", 210.0, now - Duration::hours(2));
        backend.seed_result(Some(bob), "reaction-time", 250.0, now - Duration::hours(1));
        backend.seed_result(None, "reaction-time", 100.0, now); // anonymous, excluded

        let page = service(&backend)
            .page("reaction-time", None, None)
            .await
            .unwrap();

        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.leaderboard.len(), 2);
        assert_eq!(page.leaderboard[0].rank, 1);
        assert_eq!(page.leaderboard[0].display_name, "Alice");
        assert_eq!(page.leaderboard[0].score, 210.0);
        assert_eq!(page.leaderboard[1].rank, 2);
        assert_eq!(page.leaderboard[1].score, 250.0);
    }

    #[tokio::test]
    async fn higher_better_game_sorts_descending() {
        let backend = MemoryBackend::new();
        let alice = backend.register_user("Alice", "UTC");
        let bob = backend.register_user("Bob", "UTC");
        let now = Utc::now();

        backend.seed_result(Some(alice), "sequence-memory", 12.0, now);
        backend.seed_result(Some(bob), "sequence-memory", 19.0, now);

        let page = service(&backend)
            .page("sequence-memory", None, None)
            .await
            .unwrap();

        assert_eq!(page.leaderboard[0].score, 19.0);
        assert_eq!(page.leaderboard[1].score, 12.0);
    }

    #[tokio::test]
    async fn pagination_caps_limit_and_reports_has_more() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        for i in 0..5 {
            let user = backend.register_user(&format!("user-{i}"), "UTC");
            backend.seed_result(Some(user), "typing-test", 40.0 + i as f64, now);
        }

        let svc = service(&backend);
        let first = svc.page("typing-test", Some(1), Some(2)).await.unwrap();
        assert_eq!(first.leaderboard.len(), 2);
        assert_eq!(first.pagination.total, 5);
        assert!(first.pagination.has_more);
        assert_eq!(first.leaderboard[0].rank, 1);

        let last = svc.page("typing-test", Some(3), Some(2)).await.unwrap();
        assert_eq!(last.leaderboard.len(), 1);
        assert!(!last.pagination.has_more);
        assert_eq!(last.leaderboard[0].rank, 5);

        let capped = svc.page("typing-test", Some(1), Some(500)).await.unwrap();
        assert_eq!(capped.pagination.limit, MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn unknown_game_is_rejected() {
        let backend = MemoryBackend::new();
        let result = service(&backend).page("not-a-game", None, None).await;
        assert!(matches!(result, Err(AppError::InvalidGame(_))));
    }

    #[tokio::test]
    async fn inactive_game_is_rejected_like_submissions_are() {
        use crate::games::{GameConfig, ScoreDirection};

        let backend = MemoryBackend::new();
        let user = backend.register_user("nostalgic", "UTC");
        backend.seed_result(Some(user), "retired-game", 10.0, Utc::now());

        let catalog = GameCatalog::from_games(vec![GameConfig {
            slug: "retired-game",
            name: "Retired Game",
            description: "No longer playable",
            score_direction: ScoreDirection::HigherBetter,
            score_unit: "score",
            is_active: false,
        }]);
        let svc = LeaderboardService::new(Arc::new(backend.clone()), Arc::new(catalog));

        let result = svc.page("retired-game", None, None).await;
        assert!(matches!(result, Err(AppError::InvalidGame(_))));
    }
}
