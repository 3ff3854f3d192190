//! Integration tests for drama-tracker.
//!
//! These tests drive the public API end to end, using an in-process
//! auth provider and on-disk storage in a temporary directory.

use chrono::NaiveDate;
use drama_tracker::auth::{AllowList, AuthProvider, AuthSession, AuthState, AuthUser, Credentials};
use drama_tracker::config::Config;
use drama_tracker::error::{AppError, Result};
use drama_tracker::schedule::{self, EPISODES_PER_SHOW};
use drama_tracker::session::{AuthOutcome, Tracker};
use drama_tracker::storage::{FileStorage, MemoryStorage, Storage};
use drama_tracker::store::Store;
use drama_tracker::types::Weekday;
use std::path::PathBuf;

/// Accepts any password and derives the uid from the e-mail.
struct StaticProvider;

impl StaticProvider {
    fn credentials(email: &str) -> Credentials {
        Credentials {
            user: AuthUser {
                uid: format!("uid-{}", email),
                email: email.to_string(),
            },
            refresh_token: format!("token:{}", email),
        }
    }
}

impl AuthProvider for StaticProvider {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<Credentials> {
        Ok(Self::credentials(email))
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<Credentials> {
        Ok(Self::credentials(email))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials> {
        refresh_token
            .strip_prefix("token:")
            .map(Self::credentials)
            .ok_or_else(|| AppError::Auth("Session expired. Sign in again".to_string()))
    }
}

fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
}

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("drama-tracker-it-{}", uuid::Uuid::new_v4()))
}

/// Test the weekly schedule for every weekday.
#[test]
fn test_schedule_for_every_weekday() {
    for day in Weekday::ALL {
        let show = schedule::generate("Show", day, "21:00", wednesday()).unwrap();
        assert_eq!(show.episodes.len(), EPISODES_PER_SHOW as usize);

        for (i, episode) in show.episodes.iter().enumerate() {
            assert_eq!(episode.episode_number, i as u32 + 1);
            assert_eq!(Weekday::of(episode.date), day);
            assert!(!episode.watched);
        }
        for pair in show.episodes.windows(2) {
            assert_eq!((pair[1].date - pair[0].date).num_days(), 7);
        }
    }
}

/// Test the first air date relative to a Wednesday.
#[test]
fn test_first_air_dates_end_to_end() {
    let mut store = Store::new();
    let a = store.add_show("Show A", Weekday::Mon, "21:00", wednesday()).unwrap();
    let b = store.add_show("Show B", Weekday::Wed, "22:00", wednesday()).unwrap();

    let show_a = store.shows().iter().find(|s| s.id == a).unwrap();
    let show_b = store.shows().iter().find(|s| s.id == b).unwrap();
    assert_eq!(show_a.episodes[0].date, NaiveDate::from_ymd_opt(2026, 10, 26).unwrap());
    assert_eq!(show_b.episodes[0].date, wednesday());
}

/// Test that a blank title is ignored.
#[test]
fn test_blank_title_is_ignored() {
    let mut store = Store::new();
    assert!(store.add_show("", Weekday::Mon, "21:00", wednesday()).is_none());
    assert!(store.add_show("  \t", Weekday::Mon, "21:00", wednesday()).is_none());
    assert!(store.is_empty());
}

/// Test that "watched up to" sets rather than accumulates.
#[test]
fn test_watched_up_to_is_absolute() {
    let mut store = Store::new();
    let id = store.add_show("A", Weekday::Fri, "23:30", wednesday()).unwrap();
    store.select_show(Some(id));

    assert!(store.set_watched_up_to(8));
    assert!(store.set_watched_up_to(3));

    let show = store.selected_show().unwrap();
    for episode in &show.episodes {
        assert_eq!(episode.watched, episode.episode_number <= 3);
    }
    assert_eq!(show.watched_count(), 3);
}

/// Test that toggling twice restores the episode.
#[test]
fn test_toggle_twice_restores() {
    let mut store = Store::new();
    let id = store.add_show("A", Weekday::Fri, "23:30", wednesday()).unwrap();
    store.select_show(Some(id));
    store.set_watched_up_to(2);
    let before = store.selected_show().unwrap().clone();

    let target = before.episodes[5].id;
    assert!(store.toggle_episode_watched(target));
    assert!(store.toggle_episode_watched(target));
    assert_eq!(store.selected_show().unwrap(), &before);
}

/// Test that deleting the selected show clears the selection only.
#[test]
fn test_delete_selected_show() {
    let mut store = Store::new();
    let keep = store.add_show("Keep", Weekday::Sun, "20:00", wednesday()).unwrap();
    let gone = store.add_show("Gone", Weekday::Tue, "21:00", wednesday()).unwrap();
    store.select_show(Some(keep));
    store.set_watched_up_to(4);
    let kept_before = store.selected_show().unwrap().clone();

    store.select_show(Some(gone));
    assert!(store.delete_show(gone));
    assert_eq!(store.len(), 1);
    assert!(store.selected_id().is_none());
    assert_eq!(store.shows()[0], kept_before);
}

/// Test that the display order never leaks into the stored order.
#[test]
fn test_sorted_view_keeps_insertion_order() {
    let mut store = Store::new();
    store.add_show("Sat", Weekday::Sat, "21:00", wednesday());
    store.add_show("Sun", Weekday::Sun, "21:00", wednesday());

    let view: Vec<&str> = store.sorted_view().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(view, vec!["Sun", "Sat"]);

    store.add_show("Wed", Weekday::Wed, "21:00", wednesday());
    let stored: Vec<&str> = store.shows().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(stored, vec!["Sat", "Sun", "Wed"]);
}

/// Test the stored JSON field names and weekday symbols.
#[test]
fn test_stored_json_format() {
    let mut store = Store::new();
    store.add_show("A", Weekday::Mon, "21:00", wednesday());

    let json = store.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let show = &value[0];
    assert_eq!(show["weekday"], "月");
    assert_eq!(show["time"], "21:00");
    assert_eq!(show["episodes"][0]["episodeNumber"], 1);
    assert_eq!(show["episodes"][0]["date"], "2026-10-26");
    assert_eq!(show["episodes"][0]["watched"], false);

    let restored = Store::from_json(&json).unwrap();
    assert_eq!(restored.shows(), store.shows());
}

/// Test that data written by one tracker is loaded by the next.
#[test]
fn test_file_storage_survives_restart() {
    let dir = temp_dir();
    let me = AuthState::SignedIn(AuthUser {
        uid: "uid-1".to_string(),
        email: "me@example.com".to_string(),
    });

    let mut first = Tracker::new(FileStorage::new(&dir), "dramas", AllowList::new(["me@example.com"]));
    first.handle_auth_state(&me);
    let id = first
        .add_show_on("Persisted", Weekday::Thu, "22:00", wednesday())
        .unwrap()
        .unwrap();
    first.select_show(Some(id));
    first.set_watched_up_to(5).unwrap();
    assert!(dir.join("dramas.json").exists());

    let mut second = Tracker::new(FileStorage::new(&dir), "dramas", AllowList::new(["me@example.com"]));
    assert_eq!(second.handle_auth_state(&me), AuthOutcome::Hydrated { shows: 1 });
    let show = &second.store().shows()[0];
    assert_eq!(show.title, "Persisted");
    assert_eq!(show.watched_count(), 5);
    // Selection is not persisted
    assert!(second.store().selected_id().is_none());

    std::fs::remove_dir_all(&dir).ok();
}

/// Test the sign-in flow from credentials to a hydrated tracker.
#[tokio::test]
async fn test_sign_in_hydrates_tracker() {
    let mut storage = MemoryStorage::new();
    let mut seed = Store::new();
    seed.add_show("Seeded", Weekday::Sun, "21:00", wednesday());
    storage.set("dramas", &seed.to_json().unwrap()).unwrap();

    let mut auth = AuthSession::new(StaticProvider);
    let mut subscription = auth.subscribe();
    let mut tracker = Tracker::new(storage, "dramas", AllowList::new(["Me@Example.com"]));

    let initial = subscription.next().await.unwrap();
    assert_eq!(tracker.handle_auth_state(&initial), AuthOutcome::SignedOut);

    auth.sign_in("me@example.com", "secret1").await.unwrap();
    let state = subscription.next().await.unwrap();
    assert_eq!(tracker.handle_auth_state(&state), AuthOutcome::Hydrated { shows: 1 });

    auth.sign_out();
    let state = subscription.next().await.unwrap();
    assert_eq!(tracker.handle_auth_state(&state), AuthOutcome::SignedOut);
    assert!(tracker.store().is_empty());
    assert!(tracker.storage().get("dramas").unwrap().is_some());

    subscription.unsubscribe();
}

/// Test that a user outside the allow-list is turned away.
#[tokio::test]
async fn test_disallowed_user_is_rejected() {
    let mut auth = AuthSession::new(StaticProvider);
    let mut subscription = auth.subscribe();
    let mut tracker = Tracker::new(MemoryStorage::new(), "dramas", AllowList::new(["me@example.com"]));
    subscription.try_next();

    auth.sign_in("stranger@example.com", "secret1").await.unwrap();
    let state = subscription.try_next().unwrap();
    let outcome = tracker.handle_auth_state(&state);
    assert!(matches!(outcome, AuthOutcome::Rejected(_)));

    let result = tracker.add_show_on("A", Weekday::Mon, "21:00", wednesday());
    assert!(matches!(result, Err(AppError::NotSignedIn)));
    assert!(tracker.storage().get("dramas").unwrap().is_none());
}

/// Test that short passwords never reach the provider.
#[tokio::test]
async fn test_short_password_is_rejected_locally() {
    let mut auth = AuthSession::new(StaticProvider);
    let result = auth.sign_in("me@example.com", "12345").await;
    assert!(matches!(result, Err(AppError::Auth(_))));
    assert_eq!(auth.current(), &AuthState::SignedOut);
}

/// Test config defaults and partial files.
#[test]
fn test_config_defaults() {
    let config = Config::new();
    assert_eq!(config.default_weekday, Weekday::Mon);
    assert_eq!(config.default_time, "21:00");
    assert_eq!(config.storage_key, "dramas");
    assert!(config.auth.allowed_emails.is_empty());

    let dir = temp_dir();
    let path = dir.join("config.toml");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(&path, "[auth]\nallowed_emails = [\"me@example.com\"]\n").unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.storage_key, "dramas");
    assert_eq!(loaded.auth.allowed_emails, vec!["me@example.com".to_string()]);

    std::fs::remove_dir_all(&dir).ok();
}

/// Test that an unreadable data file is left alone instead of overwritten.
#[test]
fn test_unreadable_file_is_not_overwritten() {
    let dir = temp_dir();
    let me = AuthState::SignedIn(AuthUser {
        uid: "uid-1".to_string(),
        email: "me@example.com".to_string(),
    });

    let mut seed = Store::new();
    seed.add_show("One", Weekday::Mon, "21:00", wednesday());
    seed.add_show("Two", Weekday::Tue, "21:00", wednesday());
    let mut bytes = seed.to_json().unwrap().into_bytes();
    bytes.push(0xff);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("dramas.json"), &bytes).unwrap();

    let mut tracker = Tracker::new(FileStorage::new(&dir), "dramas", AllowList::new(["me@example.com"]));
    let outcome = tracker.handle_auth_state(&me);
    assert!(matches!(outcome, AuthOutcome::Unavailable(_)));
    assert!(!tracker.is_active());

    let result = tracker.add_show_on("Three", Weekday::Wed, "21:00", wednesday());
    assert!(matches!(result, Err(AppError::NotSignedIn)));
    assert_eq!(std::fs::read(dir.join("dramas.json")).unwrap(), bytes);

    std::fs::remove_dir_all(&dir).ok();
}

/// Test that a restart restores a valid session and refuses a forged one.
#[tokio::test]
async fn test_session_restore_checks_token() {
    let dir = temp_dir();
    let cache = dir.join("session.json");

    let mut first = AuthSession::new(StaticProvider).with_cache(&cache);
    first.sign_in("me@example.com", "secret1").await.unwrap();

    let mut second = AuthSession::new(StaticProvider).with_cache(&cache);
    let restored = second.restore().await.unwrap();
    assert_eq!(restored.email, "me@example.com");

    std::fs::write(
        &cache,
        r#"{"user":{"uid":"x","email":"me@example.com"},"refresh_token":"forged"}"#,
    )
    .unwrap();
    let mut third = AuthSession::new(StaticProvider).with_cache(&cache);
    assert!(third.restore().await.is_none());
    assert_eq!(third.current(), &AuthState::SignedOut);

    std::fs::remove_dir_all(&dir).ok();
}
