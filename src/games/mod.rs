pub mod handlers;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Whether a higher or lower raw score counts as better for a game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreDirection {
    HigherBetter,
    LowerBetter,
}

/// Static catalog entry for one mini-game. Seeded in code, read-only at
/// runtime.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub score_direction: ScoreDirection,
    pub score_unit: &'static str,
    pub is_active: bool,
}

/// The full set of games the product ships with.
pub struct GameCatalog {
    games: Vec<GameConfig>,
}

impl GameCatalog {
    pub fn standard() -> Self {
        use ScoreDirection::{HigherBetter, LowerBetter};

        let game = |slug, name, description, score_direction, score_unit| GameConfig {
            slug,
            name,
            description,
            score_direction,
            score_unit,
            is_active: true,
        };

        Self {
            games: vec![
                game(
                    "reaction-time",
                    "Reaction Time",
                    "Test your visual reflexes",
                    LowerBetter,
                    "ms",
                ),
                game(
                    "aim-trainer",
                    "Aim Trainer",
                    "Click targets as fast as possible",
                    LowerBetter,
                    "ms",
                ),
                game(
                    "sequence-memory",
                    "Sequence Memory",
                    "Remember increasingly long patterns",
                    HigherBetter,
                    "level",
                ),
                game(
                    "visual-memory",
                    "Visual Memory",
                    "Remember the positions of squares",
                    HigherBetter,
                    "level",
                ),
                game(
                    "number-memory",
                    "Number Memory",
                    "Memorize the longest number",
                    HigherBetter,
                    "digits",
                ),
                game(
                    "verbal-memory",
                    "Verbal Memory",
                    "Keep as many words in memory as possible",
                    HigherBetter,
                    "score",
                ),
                game(
                    "chimp-test",
                    "Chimp Test",
                    "Test your working memory",
                    HigherBetter,
                    "numbers",
                ),
                game(
                    "typing-test",
                    "Typing Test",
                    "How many words per minute?",
                    HigherBetter,
                    "wpm",
                ),
                game(
                    "go-no-go",
                    "Go / No-Go",
                    "Test your impulse control",
                    HigherBetter,
                    "score",
                ),
                game(
                    "stroop-test",
                    "Stroop Test",
                    "Test your attention control",
                    HigherBetter,
                    "score",
                ),
                game(
                    "time-estimation",
                    "Time Estimation",
                    "How accurate is your internal clock?",
                    HigherBetter,
                    "score",
                ),
            ],
        }
    }

    /// Catalog from an explicit game list. Inactive games stay listed but
    /// reject submissions and leaderboard reads.
    pub fn from_games(games: Vec<GameConfig>) -> Self {
        Self { games }
    }

    pub fn get(&self, slug: &str) -> Option<&GameConfig> {
        self.games.iter().find(|g| g.slug == slug)
    }

    pub fn active(&self) -> impl Iterator<Item = &GameConfig> {
        self.games.iter().filter(|g| g.is_active)
    }

    pub fn active_slugs(&self) -> Vec<&'static str> {
        self.active().map(|g| g.slug).collect()
    }
}

/// Strict "is better" comparison: ties keep the existing best.
pub fn is_better_score(new_score: f64, current_best: f64, direction: ScoreDirection) -> bool {
    match direction {
        ScoreDirection::HigherBetter => new_score > current_best,
        ScoreDirection::LowerBetter => new_score < current_best,
    }
}

/// Best score among a set, per the game's direction.
pub fn best_score(scores: &[f64], direction: ScoreDirection) -> Option<f64> {
    scores.iter().copied().reduce(|best, score| {
        if is_better_score(score, best, direction) {
            score
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn standard_catalog_has_eleven_active_games() {
        let catalog = GameCatalog::standard();
        assert_eq!(catalog.active().count(), 11);
        assert!(catalog.get("reaction-time").is_some());
        assert!(catalog.get("unknown-game").is_none());
    }

    #[test]
    fn reaction_time_is_lower_better() {
        let catalog = GameCatalog::standard();
        let game = catalog.get("reaction-time").unwrap();
        assert_eq!(game.score_direction, ScoreDirection::LowerBetter);
        assert_eq!(game.score_unit, "ms");
    }

    #[rstest]
    #[case(300.0, 250.0, ScoreDirection::HigherBetter, true)]
    #[case(250.0, 300.0, ScoreDirection::HigherBetter, false)]
    #[case(250.0, 300.0, ScoreDirection::LowerBetter, true)]
    #[case(300.0, 250.0, ScoreDirection::LowerBetter, false)]
    #[case(250.0, 250.0, ScoreDirection::HigherBetter, false)]
    #[case(250.0, 250.0, ScoreDirection::LowerBetter, false)]
    fn is_better_score_cases(
        #[case] new_score: f64,
        #[case] current: f64,
        #[case] direction: ScoreDirection,
        #[case] expected: bool,
    ) {
        assert_eq!(is_better_score(new_score, current, direction), expected);
    }

    #[test]
    fn best_score_respects_direction() {
        let scores = [300.0, 250.0, 280.0];
        assert_eq!(best_score(&scores, ScoreDirection::LowerBetter), Some(250.0));
        assert_eq!(best_score(&scores, ScoreDirection::HigherBetter), Some(300.0));
        assert_eq!(best_score(&[], ScoreDirection::HigherBetter), None);
    }

    #[test]
    fn score_direction_round_trips_as_screaming_snake() {
        assert_eq!(ScoreDirection::HigherBetter.to_string(), "HIGHER_BETTER");
        assert_eq!(
            "LOWER_BETTER".parse::<ScoreDirection>().unwrap(),
            ScoreDirection::LowerBetter
        );
    }
}
