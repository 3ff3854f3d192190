//! Type definitions for the drama-tracker application.
//!
//! This module contains the core records: the broadcast weekday, shows,
//! and the episodes each show owns. The serialized form (camelCase field
//! names, weekday symbols, `YYYY-MM-DD` dates) is what gets persisted.

use crate::schedule::EPISODES_PER_SHOW;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Day of the week a show airs on, ordered Sunday first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "日")]
    Sun,
    #[serde(rename = "月")]
    Mon,
    #[serde(rename = "火")]
    Tue,
    #[serde(rename = "水")]
    Wed,
    #[serde(rename = "木")]
    Thu,
    #[serde(rename = "金")]
    Fri,
    #[serde(rename = "土")]
    Sat,
}

impl Weekday {
    /// All weekdays in display order (Sunday first).
    pub const ALL: [Weekday; 7] = [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];

    /// Index 0..6 with Sunday = 0.
    pub fn index(self) -> u32 {
        match self {
            Weekday::Sun => 0,
            Weekday::Mon => 1,
            Weekday::Tue => 2,
            Weekday::Wed => 3,
            Weekday::Thu => 4,
            Weekday::Fri => 5,
            Weekday::Sat => 6,
        }
    }

    /// Weekday for an index, wrapping modulo 7.
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 7) as usize]
    }

    /// Weekday a calendar date falls on.
    pub fn of(date: NaiveDate) -> Self {
        Self::from_index(date.weekday().num_days_from_sunday())
    }

    /// The single-character symbol used in stored data.
    pub fn symbol(self) -> &'static str {
        match self {
            Weekday::Sun => "日",
            Weekday::Mon => "月",
            Weekday::Tue => "火",
            Weekday::Wed => "水",
            Weekday::Thu => "木",
            Weekday::Fri => "金",
            Weekday::Sat => "土",
        }
    }

    /// English three-letter name.
    pub fn short_name(self) -> &'static str {
        match self {
            Weekday::Sun => "Sun",
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
        }
    }

    fn full_name(self) -> &'static str {
        match self {
            Weekday::Sun => "Sunday",
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
        }
    }

    /// The following weekday, Saturday wrapping to Sunday.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// The preceding weekday, Sunday wrapping to Saturday.
    pub fn previous(self) -> Self {
        Self::from_index(self.index() + 6)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Weekday {
    type Err = String;

    /// Accepts the stored symbol ("月") or an English name ("mon", "Monday").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(day) = Self::ALL.iter().find(|d| d.symbol() == trimmed) {
            return Ok(*day);
        }

        let lower = trimmed.to_lowercase();
        Self::ALL
            .iter()
            .find(|d| lower == d.short_name().to_lowercase() || lower == d.full_name().to_lowercase())
            .copied()
            .ok_or_else(|| format!("unknown weekday '{}'", trimmed))
    }
}

/// One scheduled broadcast of a show.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// Unique identifier for the episode.
    pub id: Uuid,

    /// One-based episode number, matching generation order.
    pub episode_number: u32,

    /// Scheduled air date.
    pub date: NaiveDate,

    /// Whether the user has watched this episode.
    pub watched: bool,
}

impl Episode {
    /// Format the episode for display in the episode list.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use drama_tracker::types::Episode;
    /// use uuid::Uuid;
    ///
    /// let ep = Episode {
    ///     id: Uuid::new_v4(),
    ///     episode_number: 3,
    ///     date: NaiveDate::from_ymd_opt(2026, 10, 26).unwrap(),
    ///     watched: true,
    /// };
    /// assert_eq!(ep.to_display(), "[x] Ep 3 (2026-10-26)");
    /// ```
    pub fn to_display(&self) -> String {
        let mark = if self.watched { "x" } else { " " };
        format!(
            "[{}] Ep {} ({})",
            mark,
            self.episode_number,
            self.date.format("%Y-%m-%d")
        )
    }
}

/// A tracked show and the episodes it owns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    /// Unique identifier for the show.
    pub id: Uuid,

    /// Display title, trimmed and non-empty.
    pub title: String,

    /// Broadcast weekday.
    pub weekday: Weekday,

    /// Broadcast time of day, display only.
    pub time: String,

    /// Exactly twelve episodes, ascending by episode number.
    pub episodes: Vec<Episode>,
}

impl Show {
    /// Number of episodes marked watched.
    pub fn watched_count(&self) -> usize {
        self.episodes.iter().filter(|e| e.watched).count()
    }

    /// Whether the show has a title and episodes numbered exactly `1..=12`.
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty()
            && self.episodes.len() == EPISODES_PER_SHOW as usize
            && self
                .episodes
                .iter()
                .zip(1..)
                .all(|(episode, number)| episode.episode_number == number)
    }

    /// Format the show for display in the show list.
    ///
    /// # Examples
    ///
    /// ```
    /// use drama_tracker::types::{Show, Weekday};
    /// use uuid::Uuid;
    ///
    /// let show = Show {
    ///     id: Uuid::new_v4(),
    ///     title: "Midnight Diner".to_string(),
    ///     weekday: Weekday::Fri,
    ///     time: "23:30".to_string(),
    ///     episodes: Vec::new(),
    /// };
    /// assert_eq!(show.to_display(), "Midnight Diner (金 23:30) 0 / 0");
    /// ```
    pub fn to_display(&self) -> String {
        format!(
            "{} ({} {}) {} / {}",
            self.title,
            self.weekday,
            self.time,
            self.watched_count(),
            self.episodes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_show() -> Show {
        let start = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let episodes = (1..=3)
            .map(|n| Episode {
                id: Uuid::new_v4(),
                episode_number: n,
                date: start + chrono::Days::new(7 * (n as u64 - 1)),
                watched: n == 1,
            })
            .collect();

        Show {
            id: Uuid::new_v4(),
            title: "Test Drama".to_string(),
            weekday: Weekday::Mon,
            time: "21:00".to_string(),
            episodes,
        }
    }

    #[test]
    fn test_weekday_index_round_trip() {
        for (i, day) in Weekday::ALL.iter().enumerate() {
            assert_eq!(day.index(), i as u32);
            assert_eq!(Weekday::from_index(i as u32), *day);
        }
    }

    #[test]
    fn test_weekday_of_date() {
        // 2026-10-19 is a Monday
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(Weekday::of(date), Weekday::Mon);
        assert_eq!(Weekday::of(date.pred_opt().unwrap()), Weekday::Sun);
    }

    #[test]
    fn test_weekday_parse_symbol_and_english() {
        assert_eq!("月".parse::<Weekday>().unwrap(), Weekday::Mon);
        assert_eq!(" 土 ".parse::<Weekday>().unwrap(), Weekday::Sat);
        assert_eq!("wed".parse::<Weekday>().unwrap(), Weekday::Wed);
        assert_eq!("Thursday".parse::<Weekday>().unwrap(), Weekday::Thu);
        assert!("someday".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_weekday_next_previous_wrap() {
        assert_eq!(Weekday::Sat.next(), Weekday::Sun);
        assert_eq!(Weekday::Sun.previous(), Weekday::Sat);
        assert_eq!(Weekday::Tue.next(), Weekday::Wed);
    }

    #[test]
    fn test_weekday_serializes_as_symbol() {
        let json = serde_json::to_string(&Weekday::Wed).unwrap();
        assert_eq!(json, "\"水\"");
        let parsed: Weekday = serde_json::from_str("\"日\"").unwrap();
        assert_eq!(parsed, Weekday::Sun);
    }

    #[test]
    fn test_show_serializes_camel_case() {
        let show = sample_show();
        let json = serde_json::to_string(&show).unwrap();
        assert!(json.contains("\"episodeNumber\":1"));
        assert!(json.contains("\"date\":\"2026-10-19\""));
        assert!(json.contains("\"weekday\":\"月\""));
    }

    #[test]
    fn test_show_watched_count() {
        let show = sample_show();
        assert_eq!(show.watched_count(), 1);
    }

    #[test]
    fn test_show_to_display() {
        let show = sample_show();
        assert_eq!(show.to_display(), "Test Drama (月 21:00) 1 / 3");
    }

    #[test]
    fn test_episode_to_display_unwatched() {
        let mut ep = sample_show().episodes[1].clone();
        ep.watched = false;
        assert_eq!(ep.to_display(), "[ ] Ep 2 (2026-10-26)");
    }

    #[test]
    fn test_well_formed_needs_twelve_episodes() {
        assert!(!sample_show().is_well_formed());

        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let show = crate::schedule::generate("Full", Weekday::Mon, "21:00", today).unwrap();
        assert!(show.is_well_formed());
    }
}
