//! Consecutive-day streak calculation over deduplicated play days.
//!
//! Both functions are pure: they operate on a sorted ascending list of unique
//! calendar days (see `calendar::unique_play_days`) and give identical
//! results no matter how many plays happened within a single day.

use chrono::NaiveDate;

/// Current consecutive-day streak ending at `today` (or yesterday).
///
/// Returns 0 when the list is empty or the most recent play day is neither
/// `today` nor the day before it. Otherwise counts backward from the last
/// play day until the first gap.
pub fn current_streak(play_days: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(&last) = play_days.last() else {
        return 0;
    };

    let still_alive = last == today || today.pred_opt() == Some(last);
    if !still_alive {
        return 0;
    }

    let mut streak = 0u32;
    let mut expected = last;
    for day in play_days.iter().rev() {
        if *day != expected {
            break;
        }
        streak += 1;
        match expected.pred_opt() {
            Some(prev) => expected = prev,
            None => break,
        }
    }

    streak
}

/// All-time longest run of consecutive play days.
///
/// 0 for an empty list, otherwise at least 1.
pub fn longest_streak(play_days: &[NaiveDate]) -> u32 {
    if play_days.is_empty() {
        return 0;
    }

    let mut longest = 1u32;
    let mut run = 1u32;
    for pair in play_days.windows(2) {
        if (pair[1] - pair[0]).num_days() == 1 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }

    longest
}
