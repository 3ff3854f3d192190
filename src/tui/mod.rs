//! Terminal User Interface for drama-tracker using ratatui.
//!
//! This module provides a login screen and a full-screen tracker with
//! panels for the show list, the add-show form and the episode list.

mod render;
mod state;
mod types;

pub use render::draw;
pub use state::App;
pub use types::{Action, Focus, FormField, LoginField, Screen};

use crossterm::event::{self, Event};
use std::io;
use std::time::Duration;

/// Poll for keyboard events with a timeout.
pub fn poll_event(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}
