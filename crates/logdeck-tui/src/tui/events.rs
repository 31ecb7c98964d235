/*
[INPUT]:  Crossterm key events
[OUTPUT]: AppState edits (focus, filter, source levels, scrolling)
[POS]:    TUI key routing
[UPDATE]: When changing keybindings
*/

use logdeck_core::{LogField, LogLevel};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{AppState, Focus, LevelOp};

/// Handles key events for the TUI.
///
/// Returns `true` if quit is requested, `false` otherwise.
pub(super) fn handle_key_event(app: &mut AppState, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if app.focus == Focus::Filter {
        handle_filter_key(app, key.code);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => app.next_focus(),
        KeyCode::Char('/') => app.focus = Focus::Filter,
        KeyCode::Char('c') => app.clear_log(),
        KeyCode::F(n) => {
            if let Some(field) = field_for_key(n) {
                app.toggle_field(field);
            }
        }
        code => match app.focus {
            Focus::Log => handle_log_key(app, code),
            Focus::Sources => handle_sources_key(app, code),
            Focus::Filter => {}
        },
    }
    false
}

fn handle_filter_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => app.focus = Focus::Log,
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char(c) => app.push_filter_char(c),
        _ => {}
    }
}

fn handle_log_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => app.scroll_log(-1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_log(1),
        KeyCode::PageUp => app.page_log(-1),
        KeyCode::PageDown => app.page_log(1),
        KeyCode::Home | KeyCode::Char('g') => app.log_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.log_to_bottom(),
        _ => {}
    }
}

fn handle_sources_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => app.move_source_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_source_cursor(1),
        KeyCode::Char(' ') => app.toggle_cursor_source(),
        KeyCode::Char('x') => app.clear_source_selection(),
        KeyCode::Char('a') => app.apply_level_op(LevelOp::ShowAll),
        KeyCode::Char('h') => app.apply_level_op(LevelOp::HideAll),
        KeyCode::Char(c @ '1'..='5') => {
            let level = LogLevel::ALL[(c as u8 - b'1') as usize];
            app.apply_level_op(LevelOp::ShowUpTo(level));
        }
        KeyCode::Char(c) => {
            if let Some(level) = level_for_letter(c.to_ascii_lowercase()) {
                let op = if c.is_ascii_uppercase() {
                    LevelOp::HideLevel(level)
                } else {
                    LevelOp::ShowLevel(level)
                };
                app.apply_level_op(op);
            }
        }
        _ => {}
    }
}

/// `e`/`w`/`i`/`d`/`t` show a level; the uppercase letter hides it.
fn level_for_letter(c: char) -> Option<LogLevel> {
    match c {
        'e' => Some(LogLevel::Error),
        'w' => Some(LogLevel::Warn),
        'i' => Some(LogLevel::Info),
        'd' => Some(LogLevel::Debug),
        't' => Some(LogLevel::Trace),
        _ => None,
    }
}

pub(super) fn field_for_key(n: u8) -> Option<LogField> {
    match n {
        1 => Some(LogField::Time),
        2 => Some(LogField::Level),
        3 => Some(LogField::Source),
        4 => Some(LogField::Attachment),
        5 => Some(LogField::Message),
        6 => Some(LogField::Error),
        _ => None,
    }
}
