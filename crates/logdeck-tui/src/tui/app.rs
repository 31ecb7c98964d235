/*
[INPUT]:  LoggingPanel, key-driven edits from events.rs
[OUTPUT]: AppState helpers for focus, quick filter, source cursor and level edits
[POS]:    TUI app state
[UPDATE]: When adding panes or hotkey-driven operations
*/

use logdeck_core::source_filter::SourceRow;
use logdeck_core::{LogField, LogLevel, LogSource, LoggingPanel};
use ratatui::widgets::ListState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Focus {
    Log,
    Sources,
    Filter,
}

/// Bulk level edit applied to the selected sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LevelOp {
    ShowAll,
    HideAll,
    ShowUpTo(LogLevel),
    ShowLevel(LogLevel),
    HideLevel(LogLevel),
}

pub(super) struct AppState {
    pub(super) panel: LoggingPanel,
    pub(super) focus: Focus,
    pub(super) filter_input: String,
    pub(super) source_list: ListState,
    pub(super) status_message: String,
}

impl AppState {
    pub(super) fn new(panel: LoggingPanel) -> Self {
        let mut source_list = ListState::default();
        source_list.select(Some(0));
        Self {
            panel,
            focus: Focus::Log,
            filter_input: String::new(),
            source_list,
            status_message: "Ready".to_string(),
        }
    }

    pub(super) fn on_tick(&mut self) {
        if self.panel.discover_sources() {
            self.clamp_source_cursor();
        }
    }

    pub(super) fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Log => Focus::Sources,
            Focus::Sources => Focus::Log,
            Focus::Filter => Focus::Log,
        };
    }

    pub(super) fn source_rows(&self) -> Vec<SourceRow> {
        self.panel.sources().rows()
    }

    fn cursor_source(&self) -> Option<LogSource> {
        let index = self.source_list.selected()?;
        self.source_rows().into_iter().nth(index).map(|row| row.source)
    }

    fn clamp_source_cursor(&mut self) {
        let len = self.source_rows().len();
        match self.source_list.selected() {
            _ if len == 0 => self.source_list.select(None),
            None => self.source_list.select(Some(0)),
            Some(selected) if selected >= len => self.source_list.select(Some(len - 1)),
            Some(_) => {}
        }
    }

    pub(super) fn move_source_cursor(&mut self, delta: isize) {
        let len = self.source_rows().len();
        if len == 0 {
            self.source_list.select(None);
            return;
        }
        let current = self.source_list.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.source_list.select(Some(next));
    }

    pub(super) fn toggle_cursor_source(&mut self) {
        let Some(source) = self.cursor_source() else {
            return;
        };
        self.panel.with_sources(|sources| sources.toggle_selected(&source));
        let count = self.panel.sources().selection().len();
        self.status_message = format!("{count} source(s) selected");
    }

    pub(super) fn clear_source_selection(&mut self) {
        self.panel.with_sources(|sources| sources.clear_selection());
        self.status_message = "Selection cleared".to_string();
    }

    pub(super) fn apply_level_op(&mut self, op: LevelOp) {
        if self.panel.sources().selection().is_empty() {
            self.status_message = "Select sources with [Space] first".to_string();
            return;
        }
        self.panel.with_sources(|sources| match op {
            LevelOp::ShowAll => sources.show_all(),
            LevelOp::HideAll => sources.hide_all(),
            LevelOp::ShowUpTo(level) => sources.show_up_to(level),
            LevelOp::ShowLevel(level) => sources.show_level(level),
            LevelOp::HideLevel(level) => sources.hide_level(level),
        });
        self.status_message = format!("Applied {op:?}");
    }

    pub(super) fn push_filter_char(&mut self, c: char) {
        self.filter_input.push(c);
        self.panel.set_text_filter(self.filter_input.clone());
    }

    pub(super) fn pop_filter_char(&mut self) {
        self.filter_input.pop();
        self.panel.set_text_filter(self.filter_input.clone());
    }

    pub(super) fn toggle_field(&mut self, field: LogField) {
        let visible = !self.panel.formatter().is_visible(field);
        self.panel.set_field_visible(field, visible);
        let state = if visible { "shown" } else { "hidden" };
        self.status_message = format!("{} {state}", field.name());
    }

    pub(super) fn clear_log(&mut self) {
        self.panel.clear();
        self.status_message = "Log cleared".to_string();
    }

    pub(super) fn scroll_log(&mut self, delta: isize) {
        self.panel.pane().with_view_mut(|view| view.scroll_by(delta));
    }

    pub(super) fn page_log(&mut self, pages: isize) {
        self.panel.pane().with_view_mut(|view| {
            let page = view.viewport().max(1) as isize;
            view.scroll_by(page * pages);
        });
    }

    pub(super) fn log_to_top(&mut self) {
        self.panel.pane().with_view_mut(|view| view.scroll_to_top());
    }

    pub(super) fn log_to_bottom(&mut self) {
        self.panel.pane().with_view_mut(|view| view.scroll_to_bottom());
    }
}
