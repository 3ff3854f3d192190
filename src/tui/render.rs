//! UI rendering functions for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::state::App;
use super::types::{Focus, FormField, LoginField, Screen};
use crate::schedule::EPISODES_PER_SHOW;

/// Draw the UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(size);

    draw_header(frame, app, chunks[0]);

    match app.screen {
        Screen::Login => draw_login(frame, app, chunks[1]),
        Screen::Tracker => draw_tracker(frame, app, chunks[1]),
    }

    draw_footer(frame, app, chunks[2]);

    if let Some(error) = &app.error_message {
        draw_error_popup(frame, error);
    }

    if app.delete_confirm_mode {
        draw_delete_confirm_popup(frame, app);
    }

    if app.show_help {
        draw_help_modal(frame, app);
    }
}

fn panel_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let user = match &app.user_email {
        Some(email) => Span::styled(format!("[{}]", email), Style::default().fg(Color::Green)),
        None => Span::styled("[signed out]", Style::default().fg(Color::DarkGray)),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "drama-tracker",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        user,
    ]))
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_login(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect(50, 60, area);
    let title = if app.register_mode { "Register" } else { "Sign In" };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // E-mail
            Constraint::Length(3), // Password
            Constraint::Min(0),    // Hint
        ])
        .split(inner);

    let masked = "*".repeat(app.password_input.chars().count());
    let fields = [
        (LoginField::Email, "E-mail", app.email_input.as_str()),
        (LoginField::Password, "Password", masked.as_str()),
    ];
    for (row, (field, label, value)) in rows.iter().zip(fields) {
        let focused = app.login_field == field;
        let input = Paragraph::new(value).block(
            Block::default()
                .borders(Borders::ALL)
                .title(label)
                .border_style(panel_style(focused)),
        );
        frame.render_widget(input, *row);

        if focused && app.error_message.is_none() {
            frame.set_cursor_position((cursor_x(*row, value), row.y + 1));
        }
    }

    let hint = if app.register_mode {
        "Creating a new account.\nCtrl+R to sign in instead."
    } else {
        "Ctrl+R to create a new account."
    };
    let hint = Paragraph::new(hint)
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
    frame.render_widget(hint, rows[2]);
}

fn draw_tracker(frame: &mut Frame, app: &mut App, area: Rect) {
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(36), // Sidebar (fixed width)
            Constraint::Min(0),     // Episodes
        ])
        .split(area);

    let sidebar_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11), // Add form
            Constraint::Min(0),     // Show list
        ])
        .split(content_chunks[0]);

    draw_add_form(frame, app, sidebar_chunks[0]);
    draw_show_list(frame, app, sidebar_chunks[1]);
    draw_episodes(frame, app, content_chunks[1]);
}

fn draw_add_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Add Show")
        .border_style(panel_style(app.focus == Focus::Form));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(inner);

    let weekday = format!("◀ {} ({}) ▶", app.weekday_input, app.weekday_input.short_name());
    let fields = [
        (FormField::Title, "Title", app.title_input.as_str()),
        (FormField::Weekday, "Weekday", weekday.as_str()),
        (FormField::Time, "Time", app.time_input.as_str()),
    ];
    for (row, (field, label, value)) in rows.iter().zip(fields) {
        let focused = app.focus == Focus::Form && app.form_field == field;
        let input = Paragraph::new(value).block(
            Block::default()
                .borders(Borders::ALL)
                .title(label)
                .border_style(panel_style(focused)),
        );
        frame.render_widget(input, *row);

        if focused && field != FormField::Weekday && !app.show_help {
            frame.set_cursor_position((cursor_x(*row, value), row.y + 1));
        }
    }
}

fn draw_show_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let border_style = panel_style(app.focus == Focus::Shows);

    if app.shows.is_empty() {
        let empty = Paragraph::new("No shows yet\n\nPress 'a' to add one")
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Shows")
                    .border_style(border_style),
            );
        frame.render_widget(empty, area);
        return;
    }

    let selected_id = app.selected_show_id;
    let items: Vec<ListItem> = app
        .shows
        .iter()
        .map(|show| {
            // Truncate title if too long (use chars to avoid UTF-8 panics)
            let title = if show.title.chars().count() > 24 {
                format!("{}...", show.title.chars().take(21).collect::<String>())
            } else {
                show.title.clone()
            };
            let title_style = if Some(show.id) == selected_id {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            ListItem::new(vec![
                Line::from(Span::styled(title, title_style)),
                Line::from(vec![
                    Span::styled(
                        format!("{} {}", show.weekday, show.time),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        format!("{} / {}", show.watched_count(), show.episodes.len()),
                        Style::default().fg(Color::Green),
                    ),
                ]),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Shows ({})", app.shows.len()))
                .border_style(border_style),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.show_list_state);
}

fn draw_episodes(frame: &mut Frame, app: &mut App, area: Rect) {
    let border_style = panel_style(app.focus == Focus::Episodes);

    let Some(show) = app.selected_show() else {
        let help = Paragraph::new("Select a show to see its episodes")
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Episodes")
                    .border_style(border_style),
            );
        frame.render_widget(help, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Watched-up-to slider
            Constraint::Min(0),    // Episode list
        ])
        .split(area);

    let title = format!("{} ({} {})", show.title, show.weekday, show.time);
    let items: Vec<ListItem> = show
        .episodes
        .iter()
        .map(|ep| {
            let style = if ep.watched {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(ep.to_display(), style))
        })
        .collect();

    let bulk_target = app.bulk_target;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Watched up to (←/→)")
                .border_style(border_style),
        )
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(f64::from(bulk_target) / f64::from(EPISODES_PER_SHOW))
        .label(format!("{} / {}", bulk_target, EPISODES_PER_SHOW));
    frame.render_widget(gauge, chunks[0]);

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[1], &mut app.episode_list_state);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match (app.screen, app.focus) {
        (Screen::Login, _) => "Tab: switch field | Enter: submit | Ctrl+R: sign in/register | Esc: quit",
        (Screen::Tracker, Focus::Shows) => {
            "j/k: move | Enter: episodes | a: add | d: delete | O: sign out | ?: help | q: quit"
        }
        (Screen::Tracker, Focus::Episodes) => {
            "j/k: move | Space: toggle | ←/→: watched up to | w: up to here | Esc: back | ?: help"
        }
        (Screen::Tracker, Focus::Form) => {
            "↑/↓: field | ←/→: weekday | Enter: add show | Esc: back"
        }
    };

    let mut spans = vec![Span::styled(help_text, Style::default().fg(Color::DarkGray))];
    if let Some(status) = &app.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Yellow)));
    }

    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

fn draw_error_popup(frame: &mut Frame, error: &str) {
    let area = centered_rect(60, 20, frame.area());
    frame.render_widget(Clear, area);

    let popup = Paragraph::new(error)
        .style(Style::default().fg(Color::Red))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(popup, area);
}

fn draw_delete_confirm_popup(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 20, frame.area());
    frame.render_widget(Clear, area);

    let title = app.pending_delete_title().unwrap_or("this show");
    let message = format!(
        "Delete \"{}\" and all of its episodes?\n\n[Y/Enter] Yes  [N/Esc] No",
        title
    );

    let popup = Paragraph::new(message)
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm Delete")
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(popup, area);
}

fn draw_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(70, 80, frame.area());
    frame.render_widget(Clear, area);

    let (title, content) = get_help_content(app);

    let help_text = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Help - {}", title))
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help_text, area);
}

fn get_help_content(app: &App) -> (&'static str, String) {
    let global_keys = "\
Global Commands
───────────────
  ?           Show/hide this help
  Ctrl+C      Force quit
  Ctrl+Q      Force quit
  Tab         Switch panel focus
  O           Sign out
  q           Quit

";

    let show_keys = "\
Shows
─────
  j / ↓       Move down
  k / ↑       Move up
  Enter       Open episodes
  a           Add a show
  d           Delete show
  Esc         Clear selection

";

    let episode_keys = "\
Episodes
────────
  j / ↓       Move down
  k / ↑       Move up
  Space       Toggle watched
  ← / →       Watched up to one fewer/more
  Home / End  Watched up to 0 / 12
  w           Watched up to highlighted episode
  Esc         Back to shows

";

    let form_keys = "\
Add Show
────────
  ↑ / ↓       Previous/next field
  ← / →       Change weekday
  Enter       Add show with 12 weekly episodes
  Esc         Back to shows

";

    match app.focus {
        Focus::Shows => (
            "Shows",
            format!("{}{}{}Press ? to close", global_keys, show_keys, form_keys),
        ),
        Focus::Episodes => (
            "Episodes",
            format!("{}{}Press ? to close", global_keys, episode_keys),
        ),
        Focus::Form => (
            "Add Show",
            format!("{}{}Press ? to close", global_keys, form_keys),
        ),
    }
}

/// Column just after `value` typed inside a bordered input.
///
/// Full-width characters take two columns.
fn cursor_x(area: Rect, value: &str) -> u16 {
    let width = u16::try_from(Span::raw(value).width()).unwrap_or(u16::MAX);
    area.x.saturating_add(width).saturating_add(1)
}

/// Helper function to create a centered rect.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_counts_display_columns() {
        let area = Rect::new(10, 0, 30, 3);
        assert_eq!(cursor_x(area, ""), 11);
        assert_eq!(cursor_x(area, "abc"), 14);
        assert_eq!(cursor_x(area, "逃げ恥"), 17);
    }

    #[test]
    fn test_cursor_never_overflows() {
        let area = Rect::new(u16::MAX - 2, 0, 2, 3);
        assert_eq!(cursor_x(area, "long input"), u16::MAX);
    }
}
