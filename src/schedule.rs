//! Weekly episode schedule generation.
//!
//! A new show gets twelve episode slots, one per week, starting on the next
//! occurrence of its broadcast weekday counted from `today` (inclusive).

use crate::types::{Episode, Show, Weekday};
use chrono::{Days, NaiveDate};
use uuid::Uuid;

/// Number of episodes generated for every show.
pub const EPISODES_PER_SHOW: u32 = 12;

/// Date of the first broadcast on `weekday`, on or after `today`.
///
/// When `today` already falls on `weekday`, the first episode airs today.
pub fn first_air_date(weekday: Weekday, today: NaiveDate) -> Option<NaiveDate> {
    let mut diff = weekday.index() as i64 - Weekday::of(today).index() as i64;
    if diff < 0 {
        diff += 7;
    }
    today.checked_add_days(Days::new(diff as u64))
}

/// Build a show with a full twelve-week episode schedule.
///
/// Returns `None` when the title is blank after trimming.
pub fn generate(title: &str, weekday: Weekday, time: &str, today: NaiveDate) -> Option<Show> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }

    let first = first_air_date(weekday, today)?;
    let episodes = (0..EPISODES_PER_SHOW)
        .map(|i| {
            Some(Episode {
                id: Uuid::new_v4(),
                episode_number: i + 1,
                date: first.checked_add_days(Days::new(7 * i as u64))?,
                watched: false,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    Some(Show {
        id: Uuid::new_v4(),
        title: title.to_string(),
        weekday,
        time: time.to_string(),
        episodes,
    })
}
