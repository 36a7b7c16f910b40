//! Badge eligibility evaluation.
//!
//! Eligibility is a pure function over freshly updated user counters; the
//! actual award is a conditional insert performed by the storage backend
//! inside the ingestion commit, so calling this twice with identical state
//! never produces a duplicate award.

use std::collections::BTreeSet;

use super::BadgeCatalog;
use crate::games::GameCatalog;

const SESSION_MILESTONES: [(&str, i64); 3] = [
    ("sessions_10", 10),
    ("sessions_50", 50),
    ("sessions_200", 200),
];

const STREAK_MILESTONES: [(&str, i32); 3] =
    [("streak_3", 3), ("streak_7", 7), ("streak_14", 14)];

const MASTERY_THRESHOLD: i64 = 100;

/// User counters as they stand *after* the submission being processed has
/// been applied. Milestones fire at-or-above their threshold, so a counter
/// jumping past a milestone still awards it.
pub struct BadgeEligibility<'a> {
    pub total_sessions: i64,
    pub current_streak: i32,
    /// Distinct game slugs ever played, including the current game.
    pub games_played: &'a BTreeSet<String>,
    /// Total plays of the current game, including this one.
    pub game_play_count: i64,
}

/// Returns every badge code the user currently qualifies for. Already-owned
/// badges are filtered out downstream by the unique-constrained insert.
pub fn eligible_codes(
    badges: &BadgeCatalog,
    games: &GameCatalog,
    game_slug: &str,
    eligibility: &BadgeEligibility<'_>,
) -> Vec<String> {
    let mut codes = Vec::new();

    if eligibility.total_sessions >= 1 {
        codes.push("first_game".to_string());
    }

    for (code, threshold) in SESSION_MILESTONES {
        if eligibility.total_sessions >= threshold {
            codes.push(code.to_string());
        }
    }

    for (code, threshold) in STREAK_MILESTONES {
        if eligibility.current_streak >= threshold {
            codes.push(code.to_string());
        }
    }

    let tried_all = games
        .active()
        .all(|g| eligibility.games_played.contains(g.slug));
    if tried_all {
        codes.push("tried_all_games".to_string());
    }

    if eligibility.game_play_count >= MASTERY_THRESHOLD {
        codes.push(format!("game_master_{game_slug}"));
    }

    // Only codes the catalog actually defines can be awarded.
    codes.retain(|code| badges.contains(code));
    codes
}
