//! Application state management and input handling.

use crate::schedule::EPISODES_PER_SHOW;
use crate::types::{Show, Weekday};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use uuid::Uuid;

use super::types::{Action, Focus, FormField, LoginField, Screen};

/// Application state for the TUI.
pub struct App {
    /// Current screen being displayed
    pub screen: Screen,
    /// Current focus on the tracker screen
    pub focus: Focus,
    /// Whether the app should quit
    pub should_quit: bool,
    /// E-mail being typed on the login screen
    pub email_input: String,
    /// Password being typed on the login screen
    pub password_input: String,
    /// Focused login field
    pub login_field: LoginField,
    /// Whether the login form registers a new account
    pub register_mode: bool,
    /// E-mail of the signed-in user
    pub user_email: Option<String>,
    /// Title typed into the add-show form
    pub title_input: String,
    /// Weekday chosen in the add-show form
    pub weekday_input: Weekday,
    /// Broadcast time typed into the add-show form
    pub time_input: String,
    /// Focused add-show field
    pub form_field: FormField,
    /// Shows in display (weekday) order
    pub shows: Vec<Show>,
    /// Id of the selected show
    pub selected_show_id: Option<Uuid>,
    /// List state for shows
    pub show_list_state: ListState,
    /// List state for episodes
    pub episode_list_state: ListState,
    /// Position of the "watched up to" slider (0..=12)
    pub bulk_target: u32,
    /// Whether we're showing the delete confirmation dialog
    pub delete_confirm_mode: bool,
    /// The show waiting for delete confirmation
    pub pending_delete: Option<Uuid>,
    /// Whether help modal is shown
    pub show_help: bool,
    /// Status message to display
    pub status_message: Option<String>,
    /// Error message to display
    pub error_message: Option<String>,
}

impl App {
    /// Create a new App on the login screen.
    pub fn new(default_weekday: Weekday, default_time: String) -> Self {
        Self {
            screen: Screen::Login,
            focus: Focus::Shows,
            should_quit: false,
            email_input: String::new(),
            password_input: String::new(),
            login_field: LoginField::Email,
            register_mode: false,
            user_email: None,
            title_input: String::new(),
            weekday_input: default_weekday,
            time_input: default_time,
            form_field: FormField::Title,
            shows: Vec::new(),
            selected_show_id: None,
            show_list_state: ListState::default(),
            episode_list_state: ListState::default(),
            bulk_target: 0,
            delete_confirm_mode: false,
            pending_delete: None,
            show_help: false,
            status_message: None,
            error_message: None,
        }
    }

    /// Switch to the login screen, dropping everything from the last session.
    pub fn show_login(&mut self) {
        self.screen = Screen::Login;
        self.login_field = if self.email_input.is_empty() {
            LoginField::Email
        } else {
            LoginField::Password
        };
        self.password_input.clear();
        self.user_email = None;
        self.shows.clear();
        self.selected_show_id = None;
        self.show_list_state.select(None);
        self.episode_list_state.select(None);
        self.delete_confirm_mode = false;
        self.pending_delete = None;
    }

    /// Switch to the tracker screen for `email`.
    pub fn show_tracker(&mut self, email: &str) {
        self.screen = Screen::Tracker;
        self.focus = Focus::Shows;
        self.user_email = Some(email.to_string());
        self.password_input.clear();
    }

    /// Replace the displayed shows and selection.
    pub fn set_shows(&mut self, shows: Vec<Show>, selected: Option<Uuid>) {
        let selection_changed = selected != self.selected_show_id;
        let previous_episodes = self.selected_show().map(|s| s.episodes.clone());
        self.shows = shows;
        self.selected_show_id = selected;

        let index = selected.and_then(|id| self.shows.iter().position(|s| s.id == id));
        match index {
            Some(i) => self.show_list_state.select(Some(i)),
            None if self.shows.is_empty() => self.show_list_state.select(None),
            None => {
                let i = self.show_list_state.selected().unwrap_or(0);
                self.show_list_state.select(Some(i.min(self.shows.len() - 1)));
            }
        }

        let current_episodes = self.selected_show().map(|s| &s.episodes);
        if selection_changed || current_episodes != previous_episodes.as_ref() {
            self.bulk_target = self.watched_up_to();
        }

        if selection_changed {
            let first = self.selected_show().map(|_| 0);
            self.episode_list_state.select(first);
        }
    }

    /// The selected show, if it is still displayed.
    pub fn selected_show(&self) -> Option<&Show> {
        let id = self.selected_show_id?;
        self.shows.iter().find(|s| s.id == id)
    }

    /// Highest watched episode number of the selected show, 0 if none.
    fn watched_up_to(&self) -> u32 {
        self.selected_show()
            .and_then(|s| s.episodes.iter().filter(|e| e.watched).map(|e| e.episode_number).max())
            .unwrap_or(0)
    }

    /// Forget the typed title after a show was added.
    pub fn clear_title_input(&mut self) {
        self.title_input.clear();
    }

    /// Set an error message.
    pub fn set_error(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
    }

    /// Clear error message.
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Set status message.
    pub fn set_status(&mut self, message: &str) {
        self.status_message = Some(message.to_string());
    }

    /// Handle keyboard input and return an action.
    pub fn handle_input(&mut self, key: KeyEvent) -> Action {
        // Global quit with Ctrl+C or Ctrl+Q
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.should_quit = true;
                    return Action::Quit;
                }
                _ => {}
            }
        }

        // Any key dismisses an error popup
        if self.error_message.is_some() {
            self.clear_error();
            return Action::None;
        }

        // Handle help modal
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return Action::None;
        }

        match self.screen {
            Screen::Login => self.handle_login_input(key),
            Screen::Tracker => self.handle_tracker_input(key),
        }
    }

    fn handle_login_input(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('r') {
                self.register_mode = !self.register_mode;
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.login_field = match self.login_field {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
                Action::None
            }
            KeyCode::Enter => match self.login_field {
                LoginField::Email => {
                    self.login_field = LoginField::Password;
                    Action::None
                }
                LoginField::Password => {
                    let email = self.email_input.trim().to_string();
                    let password = self.password_input.clone();
                    if self.register_mode {
                        Action::SignUp { email, password }
                    } else {
                        Action::SignIn { email, password }
                    }
                }
            },
            KeyCode::Char(c) => {
                self.login_input_mut().push(c);
                Action::None
            }
            KeyCode::Backspace => {
                self.login_input_mut().pop();
                Action::None
            }
            KeyCode::Esc => {
                self.should_quit = true;
                Action::Quit
            }
            _ => Action::None,
        }
    }

    fn login_input_mut(&mut self) -> &mut String {
        match self.login_field {
            LoginField::Email => &mut self.email_input,
            LoginField::Password => &mut self.password_input,
        }
    }

    fn handle_tracker_input(&mut self, key: KeyEvent) -> Action {
        if self.delete_confirm_mode {
            return self.handle_delete_confirm(key);
        }

        // The form swallows printable keys, so global shortcuts are checked after it
        if self.focus == Focus::Form {
            return self.handle_form_input(key);
        }

        match key.code {
            KeyCode::Char('?') => {
                self.show_help = true;
                return Action::None;
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Shows => Focus::Episodes,
                    Focus::Episodes => Focus::Form,
                    Focus::Form => Focus::Shows,
                };
                return Action::None;
            }
            KeyCode::Char('a') => {
                self.focus = Focus::Form;
                self.form_field = FormField::Title;
                return Action::None;
            }
            KeyCode::Char('O') => return Action::SignOut,
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Action::Quit;
            }
            _ => {}
        }

        match self.focus {
            Focus::Shows => self.handle_show_list_input(key),
            Focus::Episodes => self.handle_episode_list_input(key),
            Focus::Form => Action::None,
        }
    }

    fn handle_show_list_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                let i = self.show_list_state.selected().unwrap_or(0);
                self.select_show_at(i.saturating_sub(1))
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let i = self.show_list_state.selected().map(|i| i + 1).unwrap_or(0);
                self.select_show_at(i.min(self.shows.len().saturating_sub(1)))
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                match self.show_list_state.selected() {
                    Some(i) if i < self.shows.len() => {
                        self.focus = Focus::Episodes;
                        self.select_show_at(i)
                    }
                    _ => Action::None,
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let target = self
                    .show_list_state
                    .selected()
                    .and_then(|i| self.shows.get(i))
                    .map(|s| s.id);
                if let Some(id) = target {
                    self.pending_delete = Some(id);
                    self.delete_confirm_mode = true;
                }
                Action::None
            }
            KeyCode::Esc => Action::SelectShow(None),
            _ => Action::None,
        }
    }

    fn select_show_at(&mut self, index: usize) -> Action {
        match self.shows.get(index) {
            Some(show) => {
                self.show_list_state.select(Some(index));
                if self.selected_show_id == Some(show.id) {
                    Action::None
                } else {
                    Action::SelectShow(Some(show.id))
                }
            }
            None => Action::None,
        }
    }

    fn handle_episode_list_input(&mut self, key: KeyEvent) -> Action {
        let Some(episode_count) = self.selected_show().map(|s| s.episodes.len()) else {
            if matches!(key.code, KeyCode::Esc | KeyCode::Backspace) {
                self.focus = Focus::Shows;
            }
            return Action::None;
        };

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                let i = self.episode_list_state.selected().unwrap_or(0);
                self.episode_list_state.select(Some(i.saturating_sub(1)));
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let i = self.episode_list_state.selected().map(|i| i + 1).unwrap_or(0);
                self.episode_list_state
                    .select(Some(i.min(episode_count.saturating_sub(1))));
                Action::None
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let index = self.episode_list_state.selected();
                self.selected_show()
                    .zip(index)
                    .and_then(|(show, i)| show.episodes.get(i))
                    .map(|e| Action::ToggleEpisode(e.id))
                    .unwrap_or(Action::None)
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-') => {
                self.set_bulk_target(self.bulk_target.saturating_sub(1))
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') => {
                self.set_bulk_target(self.bulk_target + 1)
            }
            KeyCode::Home => self.set_bulk_target(0),
            KeyCode::End => self.set_bulk_target(EPISODES_PER_SHOW),
            KeyCode::Char('w') => {
                // Watched up to the highlighted episode
                let n = self.episode_list_state.selected().map(|i| i as u32 + 1);
                n.map(|n| self.set_bulk_target(n)).unwrap_or(Action::None)
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.focus = Focus::Shows;
                Action::None
            }
            _ => Action::None,
        }
    }

    /// Move the bulk slider, clamped to 0..=12.
    pub fn set_bulk_target(&mut self, n: u32) -> Action {
        self.bulk_target = n.min(EPISODES_PER_SHOW);
        Action::SetWatchedUpTo(self.bulk_target)
    }

    fn handle_form_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                self.focus = Focus::Shows;
                Action::None
            }
            KeyCode::Tab | KeyCode::Down => {
                self.form_field = self.form_field.next();
                Action::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.form_field = self.form_field.previous();
                Action::None
            }
            KeyCode::Enter => Action::AddShow {
                title: self.title_input.clone(),
                weekday: self.weekday_input,
                time: self.time_input.clone(),
            },
            KeyCode::Left if self.form_field == FormField::Weekday => {
                self.weekday_input = self.weekday_input.previous();
                Action::None
            }
            KeyCode::Right | KeyCode::Char(' ') if self.form_field == FormField::Weekday => {
                self.weekday_input = self.weekday_input.next();
                Action::None
            }
            KeyCode::Char(c) => {
                match self.form_field {
                    FormField::Title => self.title_input.push(c),
                    FormField::Time => self.time_input.push(c),
                    FormField::Weekday => {
                        if let Ok(day) = c.to_string().parse::<Weekday>() {
                            self.weekday_input = day;
                        }
                    }
                }
                Action::None
            }
            KeyCode::Backspace => {
                match self.form_field {
                    FormField::Title => {
                        self.title_input.pop();
                    }
                    FormField::Time => {
                        self.time_input.pop();
                    }
                    FormField::Weekday => {}
                }
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_delete_confirm(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.delete_confirm_mode = false;
                self.pending_delete
                    .take()
                    .map(Action::DeleteShow)
                    .unwrap_or(Action::None)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.delete_confirm_mode = false;
                self.pending_delete = None;
                Action::None
            }
            _ => Action::None,
        }
    }

    /// Title of the show waiting for delete confirmation.
    pub fn pending_delete_title(&self) -> Option<&str> {
        let id = self.pending_delete?;
        self.shows
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.title.as_str())
    }
}
