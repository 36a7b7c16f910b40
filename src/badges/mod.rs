pub mod engine;

use serde::Serialize;
use strum_macros::Display;

use crate::games::GameCatalog;

/// Badge categories, mirrored in the seeded catalog data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Milestone,
    Consistency,
    Exploration,
    Mastery,
}

/// Static catalog entry for one badge. Seeded once; awards reference badges
/// by code.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeSpec {
    pub code: String,
    pub name: String,
    pub description: String,
    pub icon: &'static str,
    pub category: BadgeCategory,
}

/// The fixed badge catalog: first play, session milestones, streak
/// milestones, tried-all-games, and one mastery badge per game.
pub struct BadgeCatalog {
    badges: Vec<BadgeSpec>,
}

impl BadgeCatalog {
    pub fn standard(games: &GameCatalog) -> Self {
        let fixed = |code: &str, name: &str, description: &str, icon, category| BadgeSpec {
            code: code.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon,
            category,
        };

        let mut badges = vec![
            fixed(
                "first_game",
                "First Steps",
                "Played your first game",
                "🎮",
                BadgeCategory::Milestone,
            ),
            fixed(
                "sessions_10",
                "Getting Started",
                "Completed 10 games",
                "🌱",
                BadgeCategory::Milestone,
            ),
            fixed(
                "sessions_50",
                "Making Progress",
                "Completed 50 games",
                "🚀",
                BadgeCategory::Milestone,
            ),
            fixed(
                "sessions_200",
                "Dedicated",
                "Completed 200 games",
                "⭐",
                BadgeCategory::Milestone,
            ),
            fixed(
                "streak_3",
                "Building Momentum",
                "Played 3 days in a row",
                "🔥",
                BadgeCategory::Consistency,
            ),
            fixed(
                "streak_7",
                "Week Warrior",
                "Played 7 days in a row",
                "🔥",
                BadgeCategory::Consistency,
            ),
            fixed(
                "streak_14",
                "Two Week Streak",
                "Played 14 days in a row",
                "🏆",
                BadgeCategory::Consistency,
            ),
            fixed(
                "tried_all_games",
                "Complete Explorer",
                "Tried all 11 games",
                "🎯",
                BadgeCategory::Exploration,
            ),
        ];

        for game in games.active() {
            badges.push(BadgeSpec {
                code: format!("game_master_{}", game.slug),
                name: format!("{} Master", game.name),
                description: format!("Played {} 100 times", game.name),
                icon: "🧠",
                category: BadgeCategory::Mastery,
            });
        }

        Self { badges }
    }

    pub fn get(&self, code: &str) -> Option<&BadgeSpec> {
        self.badges.iter().find(|b| b.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn all(&self) -> &[BadgeSpec] {
        &self.badges
    }
}
