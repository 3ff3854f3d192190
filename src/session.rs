//! Gatekeeping between auth state, the store and persistence.
//!
//! The [`Tracker`] only accepts mutations while an allow-listed user is
//! signed in and the store has been hydrated from storage. Every mutation
//! that changes something is written back immediately.

use crate::auth::{AllowList, AuthState, AuthUser, NOT_AUTHORIZED_MESSAGE};
use crate::error::{AppError, Result};
use crate::storage::Storage;
use crate::store::Store;
use crate::types::Weekday;
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use uuid::Uuid;

/// What the tracker did in response to an auth-state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// An allowed user is active; `shows` were loaded from storage.
    Hydrated { shows: usize },
    /// The user is signed in but not allowed. The caller must sign them out.
    Rejected(String),
    /// Stored data exists but could not be read. The tracker stays inactive
    /// so nothing overwrites it.
    Unavailable(String),
    /// Nobody is signed in.
    SignedOut,
}

/// The store, bound to a storage backend and an allow-list.
pub struct Tracker<S> {
    store: Store,
    storage: S,
    storage_key: String,
    allow_list: AllowList,
    user: Option<AuthUser>,
    warning: Option<String>,
}

impl<S: Storage> Tracker<S> {
    pub fn new(storage: S, storage_key: impl Into<String>, allow_list: AllowList) -> Self {
        Self {
            store: Store::new(),
            storage,
            storage_key: storage_key.into(),
            allow_list,
            user: None,
            warning: None,
        }
    }

    /// React to a sign-in or sign-out.
    ///
    /// Stored data is never modified here; a rejected or signed-out user
    /// only loses the in-memory copy.
    pub fn handle_auth_state(&mut self, state: &AuthState) -> AuthOutcome {
        match state {
            AuthState::SignedOut => {
                self.reset();
                AuthOutcome::SignedOut
            }
            AuthState::SignedIn(user) if !self.allow_list.is_allowed(&user.email) => {
                warn!("Rejected sign-in from {}", user.email);
                self.reset();
                AuthOutcome::Rejected(NOT_AUTHORIZED_MESSAGE.to_string())
            }
            AuthState::SignedIn(user) => {
                if self.user.as_ref().map(|u| &u.uid) == Some(&user.uid) {
                    debug!("Already hydrated for {}", user.email);
                    return AuthOutcome::Hydrated {
                        shows: self.store.len(),
                    };
                }

                match self.storage.get(&self.storage_key) {
                    Ok(stored) => {
                        self.store = Store::hydrate_from(stored.as_deref());
                        self.user = Some(user.clone());
                        info!("Loaded {} shows for {}", self.store.len(), user.email);
                        AuthOutcome::Hydrated {
                            shows: self.store.len(),
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read stored shows: {}", e);
                        self.reset();
                        AuthOutcome::Unavailable(format!("Saved shows could not be read: {}", e))
                    }
                }
            }
        }
    }

    fn reset(&mut self) {
        self.store.clear();
        self.user = None;
    }

    /// Whether mutations are currently accepted.
    pub fn is_active(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The last persistence problem, cleared on read.
    pub fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }

    /// Add a show whose schedule starts from today's local date.
    pub fn add_show(&mut self, title: &str, weekday: Weekday, time: &str) -> Result<Option<Uuid>> {
        self.add_show_on(title, weekday, time, Local::now().date_naive())
    }

    /// Add a show whose schedule starts from `today`.
    pub fn add_show_on(
        &mut self,
        title: &str,
        weekday: Weekday,
        time: &str,
        today: NaiveDate,
    ) -> Result<Option<Uuid>> {
        let mut added = None;
        self.mutate(|store| {
            added = store.add_show(title, weekday, time, today);
            added.is_some()
        })?;
        Ok(added)
    }

    pub fn toggle_episode_watched(&mut self, episode_id: Uuid) -> Result<bool> {
        self.mutate(|store| store.toggle_episode_watched(episode_id))
    }

    pub fn set_watched_up_to(&mut self, n: u32) -> Result<bool> {
        self.mutate(|store| store.set_watched_up_to(n))
    }

    pub fn delete_show(&mut self, id: Uuid) -> Result<bool> {
        self.mutate(|store| store.delete_show(id))
    }

    /// Selection is view state and is never persisted.
    pub fn select_show(&mut self, id: Option<Uuid>) {
        self.store.select_show(id);
    }

    fn mutate(&mut self, f: impl FnOnce(&mut Store) -> bool) -> Result<bool> {
        if !self.is_active() {
            return Err(AppError::NotSignedIn);
        }

        let changed = f(&mut self.store);
        if changed {
            self.persist();
        }
        Ok(changed)
    }

    fn persist(&mut self) {
        let written = self
            .store
            .to_json()
            .and_then(|json| self.storage.set(&self.storage_key, &json));

        if let Err(e) = written {
            warn!("Failed to save shows: {}", e);
            self.warning = Some(format!("Changes could not be saved: {}", e));
        }
    }
}
