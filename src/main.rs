//! Main entry point for the drama-tracker application.

use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use drama_tracker::auth::{AllowList, AuthProvider, AuthSession, AuthSubscription, FirebaseAuth};
use drama_tracker::config::Config;
use drama_tracker::session::{AuthOutcome, Tracker};
use drama_tracker::storage::{default_data_dir, FileStorage, Storage};
use drama_tracker::tui::{draw, poll_event, Action, App};
use log::{debug, info, warn};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Duration;

/// File the signed-in user is remembered in, inside the data directory.
const SESSION_FILE: &str = "session.json";

/// Command-line arguments for the drama-tracker application.
#[derive(Parser, Debug)]
#[command(
    name = "drama-tracker",
    version,
    about = "Track weekly drama episodes in the terminal",
    long_about = "Add shows with a 12-week broadcast schedule and keep track of watched episodes."
)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for stored shows and the session cache
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1)]
    log: u8,

    /// Firebase Web API key (overrides config)
    #[arg(short, long)]
    api_key: Option<String>,
}

/// Initialize the terminal for TUI rendering.
fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    debug!("Log level set to {:?}", log_level);

    // Load config
    let loaded = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::create_default_if_missing().and_then(|path| Config::load_from(&path)),
    };
    let config = loaded.unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        Config::new()
    });

    // Merge config with CLI args
    let Some(api_key) = args.api_key.clone().or_else(|| config.auth.api_key.clone()) else {
        eprintln!("Error: No Firebase API key configured.");
        eprintln!("       Pass --api-key or set api_key under [auth] in the config file.");
        std::process::exit(1);
    };

    let data_dir = match args.data_dir.clone().or_else(|| config.data_dir.as_ref().map(PathBuf::from)) {
        Some(dir) => dir,
        None => match default_data_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    };

    if config.auth.allowed_emails.is_empty() {
        warn!("No allowed e-mails configured; every sign-in will be rejected");
    }
    info!("Storing data in {}", data_dir.display());

    let mut auth =
        AuthSession::new(FirebaseAuth::new(api_key)).with_cache(data_dir.join(SESSION_FILE));
    let subscription = auth.subscribe();
    auth.restore().await;

    let storage = FileStorage::new(&data_dir);
    let mut tracker = Tracker::new(
        storage,
        config.storage_key.clone(),
        AllowList::new(&config.auth.allowed_emails),
    );

    // Initialize terminal
    let mut terminal = init_terminal()?;

    let mut app = App::new(config.default_weekday, config.default_time.clone());

    // Main event loop
    let result = run_app(&mut terminal, &mut app, &mut auth, subscription, &mut tracker).await;

    // Restore terminal
    restore_terminal()?;

    result
}

/// Apply every auth-state change that has arrived since the last call.
fn sync_auth<P: AuthProvider, S: Storage>(
    subscription: &mut AuthSubscription,
    auth: &mut AuthSession<P>,
    tracker: &mut Tracker<S>,
    app: &mut App,
) {
    while let Some(state) = subscription.try_next() {
        match tracker.handle_auth_state(&state) {
            AuthOutcome::Hydrated { shows } => {
                debug!("Tracker active with {} shows", shows);
                if let Some(user) = tracker.user() {
                    let email = user.email.clone();
                    app.show_tracker(&email);
                }
            }
            AuthOutcome::Rejected(message) | AuthOutcome::Unavailable(message) => {
                auth.sign_out();
                app.set_error(&message);
            }
            AuthOutcome::SignedOut => app.show_login(),
        }
    }
    refresh(app, tracker);
}

/// Copy the store's sorted view into the UI and surface storage warnings.
fn refresh<S: Storage>(app: &mut App, tracker: &mut Tracker<S>) {
    let store = tracker.store();
    let shows = store.sorted_view().into_iter().cloned().collect();
    let selected = store.selected_id();
    app.set_shows(shows, selected);

    if let Some(warning) = tracker.take_warning() {
        app.set_error(&warning);
    }
}

async fn run_app<P: AuthProvider, S: Storage>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    auth: &mut AuthSession<P>,
    mut subscription: AuthSubscription,
    tracker: &mut Tracker<S>,
) -> Result<(), Box<dyn std::error::Error>> {
    sync_auth(&mut subscription, auth, tracker, app);

    loop {
        // Draw UI
        terminal.draw(|f| draw(f, app))?;

        // Poll for events
        let Some(Event::Key(key)) = poll_event(Duration::from_millis(100))? else {
            continue;
        };

        match app.handle_input(key) {
            Action::None => {}
            Action::Quit => break,
            Action::SignIn { email, password } => {
                app.set_status("Signing in...");
                terminal.draw(|f| draw(f, app))?;

                if let Err(e) = auth.sign_in(&email, &password).await {
                    app.set_error(&e.to_string());
                }
                app.status_message = None;
            }
            Action::SignUp { email, password } => {
                app.set_status("Creating account...");
                terminal.draw(|f| draw(f, app))?;

                if let Err(e) = auth.sign_up(&email, &password).await {
                    app.set_error(&e.to_string());
                }
                app.status_message = None;
            }
            Action::SignOut => auth.sign_out(),
            Action::AddShow {
                title,
                weekday,
                time,
            } => match tracker.add_show(&title, weekday, &time) {
                Ok(Some(_)) => {
                    app.clear_title_input();
                    app.set_status(&format!("Added {}", title.trim()));
                }
                Ok(None) => {}
                Err(e) => app.set_error(&e.to_string()),
            },
            Action::SelectShow(id) => tracker.select_show(id),
            Action::ToggleEpisode(id) => {
                if let Err(e) = tracker.toggle_episode_watched(id) {
                    app.set_error(&e.to_string());
                }
            }
            Action::SetWatchedUpTo(n) => {
                if let Err(e) = tracker.set_watched_up_to(n) {
                    app.set_error(&e.to_string());
                }
            }
            Action::DeleteShow(id) => match tracker.delete_show(id) {
                Ok(true) => app.set_status("Show deleted"),
                Ok(false) => {}
                Err(e) => app.set_error(&e.to_string()),
            },
        }

        sync_auth(&mut subscription, auth, tracker, app);

        if app.should_quit {
            break;
        }
    }

    subscription.unsubscribe();
    Ok(())
}
