/*
[INPUT]:  TUI app state
[OUTPUT]: Full-screen layout and panel draw functions
[POS]:    TUI UI module root
[UPDATE]: When changing the screen layout
*/

mod footer;
mod logs;
mod sources;

use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};

use super::app::{AppState, Focus};

use footer::{draw_filter, draw_footer};
use logs::draw_logs;
use sources::draw_sources;

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Magenta)
    }
}

/// Main render function - called every frame
pub(in crate::tui) fn draw_ui(frame: &mut ratatui::Frame, app: &mut AppState) {
    let area = frame.area();

    let [main_area, filter_area, footer_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Length(4),
    ])
    .areas(area);

    let [sources_area, logs_area] = Layout::horizontal([
        Constraint::Percentage(25),
        Constraint::Fill(1),
    ])
    .areas(main_area);

    let focus = app.focus;
    draw_sources(frame, sources_area, app, focus == Focus::Sources);
    draw_logs(frame, logs_area, app.panel.pane(), focus == Focus::Log);
    draw_filter(frame, filter_area, app);
    draw_footer(frame, footer_area, app);
}
