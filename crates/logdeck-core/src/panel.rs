/*
[INPUT]:  LogRecorder history, source filter edits, quick-filter text, field toggles
[OUTPUT]: Filtered, formatted item stream fed to the ItemTextPane
[POS]:    Orchestration layer - the logging view model
[UPDATE]: When changing which edits trigger a full rebuild
*/

use std::sync::Arc;

use tracing::debug;

use crate::append_log::Iter;
use crate::formatter::{LogField, LogFormatter};
use crate::message::{LogMessage, StyledText};
use crate::recorder::{LogRecorder, ObserverHandle};
use crate::render::ItemTextPane;
use crate::source_filter::SourceFilter;

/// Case-insensitive quick filter: every whitespace-separated term must occur.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFilter {
    pattern: String,
    terms: Vec<String>,
}

impl TextFilter {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let terms = pattern
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        Self { pattern, terms }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let haystack = text.to_lowercase();
        self.terms.iter().all(|term| haystack.contains(term.as_str()))
    }
}

/// Recorder, formatter, source filter, quick filter and renderer wired into
/// one view.
///
/// Every filter or format change re-derives the whole item stream from the
/// recorder and hands it to the pane, which cancels the previous generation.
/// New messages only trigger the pane's coalesced catch-up pass.
pub struct LoggingPanel {
    recorder: LogRecorder,
    formatter: Arc<LogFormatter>,
    sources: SourceFilter,
    text_filter: TextFilter,
    pane: ItemTextPane,
    observer: ObserverHandle,
    discovery: Iter<Arc<LogMessage>>,
}

impl std::fmt::Debug for LoggingPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingPanel")
            .field("recorder", &self.recorder)
            .field("text_filter", &self.text_filter)
            .field("pane", &self.pane)
            .finish()
    }
}

impl LoggingPanel {
    pub fn new(recorder: LogRecorder, formatter: Arc<LogFormatter>, pane: ItemTextPane) -> Self {
        let notify = pane.clone();
        let observer = recorder.add_observer(Arc::new(move || notify.update()));
        let discovery = recorder.iter();

        let mut panel = Self {
            recorder,
            formatter,
            sources: SourceFilter::new(),
            text_filter: TextFilter::default(),
            pane,
            observer,
            discovery,
        };
        panel.discover_sources();
        panel.rebuild();
        panel
    }

    pub fn recorder(&self) -> &LogRecorder {
        &self.recorder
    }

    pub fn formatter(&self) -> &LogFormatter {
        &self.formatter
    }

    pub fn pane(&self) -> &ItemTextPane {
        &self.pane
    }

    pub fn sources(&self) -> &SourceFilter {
        &self.sources
    }

    pub fn text_filter(&self) -> &TextFilter {
        &self.text_filter
    }

    /// Re-derives the item stream from the full recorded history.
    pub fn rebuild(&self) {
        let predicate = self.sources.filter();
        let formatter = self.formatter.clone();
        let text_filter = self.text_filter.clone();

        let items = self
            .recorder
            .stream()
            .filter(move |message| predicate.test(message))
            .map(move |message| StyledText::new(message.level().into(), formatter.format(&message)))
            .filter(move |item| text_filter.matches(&item.text));

        debug!(pattern = %self.text_filter.pattern(), "rebuilding log view");
        self.pane.set_data(items);
    }

    pub fn set_text_filter(&mut self, pattern: impl Into<String>) {
        let filter = TextFilter::new(pattern);
        if filter == self.text_filter {
            return;
        }
        self.text_filter = filter;
        self.rebuild();
    }

    /// Applies an edit to the source filter, then rebuilds.
    pub fn with_sources<R>(&mut self, edit: impl FnOnce(&mut SourceFilter) -> R) -> R {
        let result = edit(&mut self.sources);
        self.rebuild();
        result
    }

    pub fn set_field_visible(&self, field: LogField, visible: bool) {
        if self.formatter.is_visible(field) == visible {
            return;
        }
        self.formatter.set_visible(field, visible);
        self.rebuild();
    }

    /// Feeds sources of messages recorded since the last call into the
    /// source tree. Does not rebuild the view.
    pub fn discover_sources(&mut self) -> bool {
        let mut unseen = Vec::new();
        for message in self.discovery.by_ref() {
            if !self.sources.contains(message.source()) {
                unseen.push(message.source().clone());
            }
        }
        self.sources.update_sources(unseen)
    }

    /// Drops the recorded history and empties the view.
    pub fn clear(&mut self) {
        self.recorder.clear();
        self.rebuild();
    }
}

impl Drop for LoggingPanel {
    fn drop(&mut self) {
        self.recorder.remove_observer(self.observer);
    }
}
