//! A terminal tracker for weekly broadcast dramas.
//!
//! drama-tracker keeps a list of shows, each with twelve weekly episodes
//! generated from the weekday it airs on, and records which episodes have
//! been watched. Data is stored locally and the app is gated behind a
//! Firebase e-mail/password sign-in restricted to an allow-list.
//!
//! # Features
//!
//! - Generate a 12-episode schedule from a title, weekday and time
//! - Toggle single episodes or mark "watched up to episode n"
//! - Shows listed Sunday through Saturday
//! - Data saved after every change
//!
//! # Usage
//!
//! ```bash
//! # Run with the API key from the config file
//! cargo run
//!
//! # Run with an explicit API key and data directory
//! cargo run -- --api-key KEY --data-dir ./data
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod store;
pub mod tui;
pub mod types;
