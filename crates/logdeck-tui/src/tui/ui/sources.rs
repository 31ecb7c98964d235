/*
[INPUT]:  SourceFilter rows + source cursor state
[OUTPUT]: Source tree list with per-level visibility markers
[POS]:    TUI UI sources panel rendering
[UPDATE]: When changing the source row layout
*/

use logdeck_core::LogLevel;
use logdeck_core::source_filter::SourceRow;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};

use super::border_style;
use crate::tui::app::AppState;

fn level_letter(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "E",
        LogLevel::Warn => "W",
        LogLevel::Info => "I",
        LogLevel::Debug => "D",
        LogLevel::Trace => "T",
    }
}

fn source_line(row: &SourceRow) -> Line<'static> {
    let marker = if row.selected { "[x] " } else { "[ ] " };
    let label_style = if row.settings.visible {
        Style::default()
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    };

    let mut spans = vec![
        Span::raw(marker),
        Span::raw("  ".repeat(row.depth)),
        Span::styled(row.source.leaf().to_string(), label_style),
        Span::raw(" "),
    ];
    for level in LogLevel::ALL {
        let shown = row.settings.visible && row.settings.levels.contains(level);
        let style = if shown {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(level_letter(level), style));
    }
    Line::from(spans)
}

pub(super) fn draw_sources(
    frame: &mut ratatui::Frame,
    area: ratatui::layout::Rect,
    app: &mut AppState,
    focused: bool,
) {
    let rows = app.source_rows();
    let items = rows
        .iter()
        .map(|row| ListItem::new(source_line(row)))
        .collect::<Vec<_>>();

    let title = match app.panel.sources().selection().len() {
        0 => "Sources".to_string(),
        n => format!("Sources ({n} selected)"),
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(focused))
                .title(title),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut app.source_list);
}
