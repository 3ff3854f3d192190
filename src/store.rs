//! In-memory watch-state store.
//!
//! The store owns every tracked show in insertion order plus an optional
//! selection. Mutations never touch a snapshot handed out earlier: each one
//! builds a fresh collection and swaps it in.

use crate::schedule::{self, EPISODES_PER_SHOW};
use crate::types::{Show, Weekday};
use chrono::NaiveDate;
use log::{debug, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Show collection and the currently selected show.
#[derive(Debug, Clone, Default)]
pub struct Store {
    shows: Arc<Vec<Show>>,
    selected: Option<Uuid>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `shows` in the given order.
    pub fn with_shows(shows: Vec<Show>) -> Self {
        Self {
            shows: Arc::new(shows),
            selected: None,
        }
    }

    /// Shared handle to the current collection.
    pub fn snapshot(&self) -> Arc<Vec<Show>> {
        Arc::clone(&self.shows)
    }

    /// Shows in insertion order.
    pub fn shows(&self) -> &[Show] {
        &self.shows
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    /// Drop every show and the selection.
    pub fn clear(&mut self) {
        self.shows = Arc::new(Vec::new());
        self.selected = None;
    }

    /// Id of the selected show, if any (it may no longer exist).
    pub fn selected_id(&self) -> Option<Uuid> {
        self.selected
    }

    /// Set or clear the selection. Existence is not checked.
    pub fn select_show(&mut self, id: Option<Uuid>) {
        self.selected = id;
    }

    /// The selected show, or `None` if nothing (or a stale id) is selected.
    pub fn selected_show(&self) -> Option<&Show> {
        let id = self.selected?;
        self.shows.iter().find(|s| s.id == id)
    }

    /// Add a show with a generated twelve-week schedule.
    ///
    /// Returns the new show's id, or `None` if the title is blank.
    pub fn add_show(
        &mut self,
        title: &str,
        weekday: Weekday,
        time: &str,
        today: NaiveDate,
    ) -> Option<Uuid> {
        let show = schedule::generate(title, weekday, time, today)?;
        let id = show.id;
        debug!("Adding show '{}' airing {} {}", show.title, weekday, time);

        let mut shows = Vec::with_capacity(self.shows.len() + 1);
        shows.extend(self.shows.iter().cloned());
        shows.push(show);
        self.shows = Arc::new(shows);
        Some(id)
    }

    /// Flip the watched flag of an episode of the selected show.
    ///
    /// Returns `false` when nothing is selected or the episode belongs to
    /// another show.
    pub fn toggle_episode_watched(&mut self, episode_id: Uuid) -> bool {
        let Some(show) = self.selected_show() else {
            return false;
        };
        if !show.episodes.iter().any(|e| e.id == episode_id) {
            return false;
        }

        let show_id = show.id;
        self.replace_show(show_id, |show| {
            for episode in &mut show.episodes {
                if episode.id == episode_id {
                    episode.watched = !episode.watched;
                }
            }
        });
        true
    }

    /// Mark episodes `1..=n` of the selected show watched and the rest unwatched.
    ///
    /// `n` must be within `0..=12`; anything else, or no selection, is a no-op.
    pub fn set_watched_up_to(&mut self, n: u32) -> bool {
        if n > EPISODES_PER_SHOW {
            return false;
        }
        let Some(show_id) = self.selected_show().map(|s| s.id) else {
            return false;
        };

        self.replace_show(show_id, |show| {
            for episode in &mut show.episodes {
                episode.watched = episode.episode_number <= n;
            }
        });
        true
    }

    /// Remove a show and all of its episodes.
    pub fn delete_show(&mut self, id: Uuid) -> bool {
        if !self.shows.iter().any(|s| s.id == id) {
            return false;
        }

        self.shows = Arc::new(self.shows.iter().filter(|s| s.id != id).cloned().collect());
        if self.selected == Some(id) {
            self.selected = None;
        }
        true
    }

    /// Shows ordered by weekday (Sunday first), ties kept in insertion order.
    ///
    /// This is a derived view; the stored order is left alone.
    pub fn sorted_view(&self) -> Vec<&Show> {
        let mut view: Vec<&Show> = self.shows.iter().collect();
        view.sort_by_key(|s| s.weekday.index());
        view
    }

    /// Serialize the whole collection for storage.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self.shows.as_ref())?)
    }

    /// Parse a stored collection.
    ///
    /// Shows without a title or without exactly twelve episodes numbered
    /// `1..=12` are dropped.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let mut shows: Vec<Show> = serde_json::from_str(json)?;
        let total = shows.len();
        shows.retain(Show::is_well_formed);
        if shows.len() < total {
            warn!("Dropped {} malformed stored shows", total - shows.len());
        }
        Ok(Self::with_shows(shows))
    }

    /// Build a store from a possibly missing or malformed stored value.
    ///
    /// Anything that does not parse yields an empty store.
    pub fn hydrate_from(stored: Option<&str>) -> Self {
        match stored {
            None => Self::new(),
            Some(json) => Self::from_json(json).unwrap_or_else(|e| {
                warn!("Stored shows are unreadable ({}). Starting empty.", e);
                Self::new()
            }),
        }
    }

    fn replace_show(&mut self, id: Uuid, update: impl FnOnce(&mut Show)) {
        let mut update = Some(update);
        self.shows = Arc::new(
            self.shows
                .iter()
                .map(|s| {
                    let mut show = s.clone();
                    if show.id == id {
                        if let Some(f) = update.take() {
                            f(&mut show);
                        }
                    }
                    show
                })
                .collect(),
        );
    }
}
