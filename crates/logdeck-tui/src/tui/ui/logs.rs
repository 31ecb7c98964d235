/*
[INPUT]:  ItemTextPane view (installed document + scroll state)
[OUTPUT]: Log panel rendered into Ratatui frame
[POS]:    TUI UI logs panel rendering
[UPDATE]: When changing level colours or the log panel title
*/

use logdeck_core::{ItemTextPane, LevelStyle, LogLevel};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::border_style;

fn level_style(style: LevelStyle) -> Style {
    match style {
        LevelStyle::Plain => Style::default(),
        LevelStyle::Level(LogLevel::Error) => Style::default()
            .fg(Color::LightRed)
            .add_modifier(Modifier::BOLD),
        LevelStyle::Level(LogLevel::Warn) => Style::default().fg(Color::Yellow),
        LevelStyle::Level(LogLevel::Info) => Style::default(),
        LevelStyle::Level(LogLevel::Debug) => Style::default().fg(Color::Cyan),
        LevelStyle::Level(LogLevel::Trace) => Style::default().fg(Color::DarkGray),
    }
}

pub(super) fn draw_logs(
    frame: &mut ratatui::Frame,
    area: ratatui::layout::Rect,
    pane: &ItemTextPane,
    focused: bool,
) {
    let available = area.height.saturating_sub(2) as usize;
    let (lines, total, following) = pane.with_view_mut(|view| {
        view.set_viewport(available);
        (view.visible_lines(), view.line_count(), view.at_bottom())
    });

    let text = lines
        .into_iter()
        .map(|fragments| {
            Line::from(
                fragments
                    .into_iter()
                    .map(|(style, text)| Span::styled(text, level_style(style)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>();

    let title = if following {
        format!("Logs ({total} lines, following)")
    } else {
        format!("Logs ({total} lines)")
    };
    let log_widget = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(focused))
            .title(title),
    );
    frame.render_widget(log_widget, area);
}
