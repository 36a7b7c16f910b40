use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::models::{GamePopulationSummary, PopulationAggregateRow, RecomputeSummary};
use super::repository::PopulationRepository;
use crate::games::GameCatalog;
use crate::shared::AppError;

/// Percentile via linear interpolation between order statistics:
/// index = p/100 * (n-1), interpolated by the fractional weight.
/// `sorted` must be ascending and non-empty.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let index = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = index - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Batch recompute of per-game population statistics
pub struct PopulationService {
    repository: Arc<dyn PopulationRepository>,
    games: Arc<GameCatalog>,
}

impl PopulationService {
    pub fn new(repository: Arc<dyn PopulationRepository>, games: Arc<GameCatalog>) -> Self {
        Self { repository, games }
    }

    /// Full recompute for every active game, snapshotted under `as_of`.
    /// Games without any results are skipped; rerunning on the same date
    /// overwrites the existing snapshot rather than duplicating it.
    #[instrument(skip(self))]
    pub async fn recompute(&self, as_of: NaiveDate) -> Result<RecomputeSummary, AppError> {
        info!(%as_of, "Recomputing population statistics");

        let mut processed = 0;
        for game in self.games.active() {
            let mut scores = self.repository.scores_for_game(game.slug).await?;
            if scores.is_empty() {
                debug!(game_slug = game.slug, "No results yet, skipping");
                continue;
            }
            scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            let plays = scores.len() as i64;
            let sum: f64 = scores.iter().sum();
            let row = PopulationAggregateRow {
                game_slug: game.slug.to_string(),
                date: as_of,
                plays,
                mean: sum / plays as f64,
                p25: percentile(&scores, 25.0),
                p50: percentile(&scores, 50.0),
                p75: percentile(&scores, 75.0),
                min: scores[0],
                max: scores[scores.len() - 1],
                updated_at: Utc::now(),
            };

            self.repository.upsert_aggregate(&row).await?;
            processed += 1;
        }

        info!(processed, "Population statistics recomputed");
        Ok(RecomputeSummary { processed })
    }

    /// Latest snapshot per active game; a game with no snapshot yet is
    /// reported with zeroes and `has_data: false`.
    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<Vec<GamePopulationSummary>, AppError> {
        let mut summaries = Vec::new();
        for game in self.games.active() {
            let latest = self.repository.latest_aggregate(game.slug).await?;
            summaries.push(match latest {
                Some(row) => GamePopulationSummary {
                    game_slug: row.game_slug,
                    plays: row.plays,
                    mean: row.mean,
                    p25: row.p25,
                    p50: row.p50,
                    p75: row.p75,
                    min: row.min,
                    max: row.max,
                    updated_at: Some(row.updated_at),
                    has_data: true,
                },
                None => GamePopulationSummary {
                    game_slug: game.slug.to_string(),
                    plays: 0,
                    mean: 0.0,
                    p25: 0.0,
                    p50: 0.0,
                    p75: 0.0,
                    min: 0.0,
                    max: 0.0,
                    updated_at: None,
                    has_data: false,
                },
            });
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryBackend;
    use chrono::Utc;
    use rstest::rstest;

    fn service(backend: &MemoryBackend) -> PopulationService {
        PopulationService::new(
            Arc::new(backend.clone()),
            Arc::new(GameCatalog::standard()),
        )
    }

    #[rstest]
    #[case(&[200.0, 250.0, 300.0, 350.0, 400.0], 50.0, 300.0)]
    #[case(&[100.0, 200.0, 300.0, 400.0], 50.0, 250.0)]
    #[case(&[200.0, 250.0, 300.0, 350.0, 400.0], 25.0, 250.0)]
    #[case(&[200.0, 250.0, 300.0, 350.0, 400.0], 75.0, 350.0)]
    #[case(&[42.0], 50.0, 42.0)]
    fn percentile_interpolates_between_order_statistics(
        #[case] scores: &[f64],
        #[case] p: f64,
        #[case] expected: f64,
    ) {
        assert!((percentile(scores, p) - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn recompute_produces_expected_stats() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        for score in [200.0, 250.0, 300.0, 350.0, 400.0] {
            backend.seed_result(None, "reaction-time", score, now);
        }

        let svc = service(&backend);
        let summary = svc.recompute(now.date_naive()).await.unwrap();
        assert_eq!(summary.processed, 1);

        let rows = svc.summary().await.unwrap();
        let reaction = rows
            .iter()
            .find(|s| s.game_slug == "reaction-time")
            .unwrap();
        assert!(reaction.has_data);
        assert_eq!(reaction.plays, 5);
        assert_eq!(reaction.mean, 300.0);
        assert_eq!(reaction.p50, 300.0);
        assert_eq!(reaction.min, 200.0);
        assert_eq!(reaction.max, 400.0);

        let untouched = rows.iter().find(|s| s.game_slug == "chimp-test").unwrap();
        assert!(!untouched.has_data);
        assert_eq!(untouched.plays, 0);
    }

    #[tokio::test]
    async fn rerun_on_same_date_overwrites_instead_of_duplicating() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        backend.seed_result(None, "typing-test", 60.0, now);
        backend.seed_result(None, "typing-test", 80.0, now);

        let svc = service(&backend);
        let today = now.date_naive();
        svc.recompute(today).await.unwrap();
        let first = svc.summary().await.unwrap();
        svc.recompute(today).await.unwrap();
        let second = svc.summary().await.unwrap();

        let pick = |rows: &[GamePopulationSummary]| {
            rows.iter()
                .find(|s| s.game_slug == "typing-test")
                .map(|s| (s.plays, s.mean, s.p50))
                .unwrap()
        };
        assert_eq!(pick(&first), pick(&second));
        assert_eq!(backend.population_row_count(), 1);
    }

    #[tokio::test]
    async fn empty_store_processes_nothing() {
        let backend = MemoryBackend::new();
        let svc = service(&backend);
        let summary = svc.recompute(Utc::now().date_naive()).await.unwrap();
        assert_eq!(summary.processed, 0);
    }
}
