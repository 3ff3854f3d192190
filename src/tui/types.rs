//! TUI type definitions for screens, focus, and actions.

use crate::types::Weekday;
use uuid::Uuid;

/// The current screen/view of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// E-mail/password form
    Login,
    /// Show list, add form and episode list
    Tracker,
}

/// Which panel of the tracker screen receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Shows,
    Episodes,
    Form,
}

/// Fields of the add-show form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Weekday,
    Time,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Title => FormField::Weekday,
            FormField::Weekday => FormField::Time,
            FormField::Time => FormField::Title,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FormField::Title => FormField::Time,
            FormField::Weekday => FormField::Title,
            FormField::Time => FormField::Weekday,
        }
    }
}

/// Fields of the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

/// Actions that can be returned from the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No action, continue running
    None,
    /// Quit the application
    Quit,
    /// Sign in with the given credentials
    SignIn { email: String, password: String },
    /// Register and sign in with the given credentials
    SignUp { email: String, password: String },
    /// Sign out of the current session
    SignOut,
    /// Add a show and generate its episodes
    AddShow {
        title: String,
        weekday: Weekday,
        time: String,
    },
    /// Change the selected show
    SelectShow(Option<Uuid>),
    /// Flip one episode's watched flag
    ToggleEpisode(Uuid),
    /// Mark episodes 1..=n watched, the rest unwatched
    SetWatchedUpTo(u32),
    /// Delete a show and all of its episodes
    DeleteShow(Uuid),
}
