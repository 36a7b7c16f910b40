use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;

use crate::shared::AppError;

/// Resolves a UTC instant to the civil calendar day in the given IANA
/// timezone. A play at 23:30 local time must not land on the next UTC day,
/// so all day-key derivation in the crate goes through here.
///
/// An unknown timezone identifier is an error; it never silently falls back
/// to UTC.
pub fn local_day(instant: DateTime<Utc>, timezone: &str) -> Result<NaiveDate, AppError> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| AppError::Timezone(timezone.to_string()))?;
    Ok(instant.with_timezone(&tz).date_naive())
}

/// Renders a calendar day as the wire-format "YYYY-MM-DD" key.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Maps raw play timestamps onto their local calendar days, deduplicated and
/// sorted ascending. The streak calculator consumes exactly this shape.
pub fn unique_play_days(
    timestamps: &[DateTime<Utc>],
    timezone: &str,
) -> Result<Vec<NaiveDate>, AppError> {
    let mut days = BTreeSet::new();
    for ts in timestamps {
        days.insert(local_day(*ts, timezone)?);
    }
    Ok(days.into_iter().collect())
}
