/*
[INPUT]:  AppState focus, quick-filter text, formatter field visibility, status message
[OUTPUT]: Filter bar and hotkey footer
[POS]:    TUI UI bottom bars
[UPDATE]: When changing hotkeys or field toggles
*/

use logdeck_core::LogField;
use ratatui::layout::Position;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use super::border_style;
use crate::tui::app::{AppState, Focus};
use crate::tui::events::field_for_key;

pub(super) fn draw_filter(
    frame: &mut ratatui::Frame,
    area: ratatui::layout::Rect,
    app: &AppState,
) {
    let focused = app.focus == Focus::Filter;
    let prompt = "/ ";
    let widget = Paragraph::new(Line::from(vec![
        Span::styled(prompt, Style::default().fg(Color::Yellow)),
        Span::raw(app.filter_input.as_str()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(focused))
            .title("Quick filter"),
    );
    frame.render_widget(widget, area);

    if focused {
        let width = (prompt.width() + app.filter_input.width()) as u16;
        let x = area.x.saturating_add(1).saturating_add(width);
        let x = x.min(area.right().saturating_sub(2));
        frame.set_cursor_position(Position::new(x, area.y + 1));
    }
}

pub(super) fn draw_footer(
    frame: &mut ratatui::Frame,
    area: ratatui::layout::Rect,
    app: &AppState,
) {
    let key_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let line1 = Line::from(vec![
        Span::styled("[Tab]", key_style),
        Span::raw(" Focus  "),
        Span::styled("[/]", key_style),
        Span::raw(" Filter  "),
        Span::styled("[Space]", key_style),
        Span::raw(" Select  "),
        Span::styled("[a/h]", key_style),
        Span::raw(" Show/Hide  "),
        Span::styled("[1-5]", key_style),
        Span::raw(" Up to level  "),
        Span::styled("[c]", key_style),
        Span::raw(" Clear  "),
        Span::styled("[q]", key_style),
        Span::raw(" Quit  "),
        Span::raw(format!("Status: {}", app.status_message)),
    ]);

    let formatter = app.panel.formatter();
    let mut fields = Vec::new();
    for n in 1..=6u8 {
        let Some(field) = field_for_key(n) else {
            continue;
        };
        let style = if formatter.is_visible(field) {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        fields.push(Span::styled(format!("[F{n}]"), key_style));
        fields.push(Span::styled(format!(" {}  ", field_label(field)), style));
    }
    let line2 = Line::from(fields);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(false))
        .title("Hotkeys");
    let text = Text::from(vec![line1, line2]);
    let widget = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

fn field_label(field: LogField) -> &'static str {
    match field {
        LogField::Time => "Time",
        LogField::Level => "Level",
        LogField::Source => "Source",
        LogField::Attachment => "Attachment",
        LogField::Message => "Message",
        LogField::Error => "Error",
    }
}
