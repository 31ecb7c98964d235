use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::trace;

use crate::message::{LevelStyle, StyledText};
use crate::ui_queue::UiHandle;

use super::Document;
use super::calculator::DocumentCalculator;

/// The installed document plus scroll state.
#[derive(Debug)]
pub struct TextView {
    document: Arc<Mutex<Document>>,
    scroll_top: usize,
    viewport: usize,
}

impl Default for TextView {
    fn default() -> Self {
        Self {
            document: Arc::new(Mutex::new(Document::new())),
            scroll_top: 0,
            viewport: 0,
        }
    }
}

impl TextView {
    pub fn line_count(&self) -> usize {
        self.document.lock().line_count()
    }

    pub fn text(&self) -> String {
        self.document.lock().text().to_string()
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    fn max_top(&self) -> usize {
        self.line_count().saturating_sub(self.viewport.max(1))
    }

    pub fn at_bottom(&self) -> bool {
        self.scroll_top >= self.max_top()
    }

    /// Visible height in lines. A view pinned to the bottom stays pinned.
    pub fn set_viewport(&mut self, lines: usize) {
        let pinned = self.at_bottom();
        self.viewport = lines;
        self.fix_scroll(pinned);
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let target = self.scroll_top.saturating_add_signed(delta);
        self.scroll_top = target.min(self.max_top());
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_top = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.max_top();
    }

    fn fix_scroll(&mut self, pinned: bool) {
        if pinned {
            self.scroll_to_bottom();
        } else {
            self.scroll_top = self.scroll_top.min(self.max_top());
        }
    }

    /// Owned fragments of the lines inside the viewport.
    pub fn visible_lines(&self) -> Vec<Vec<(LevelStyle, String)>> {
        let document = self.document.lock();
        let end = (self.scroll_top + self.viewport.max(1)).min(document.line_count());
        (self.scroll_top..end)
            .map(|index| {
                document
                    .line(index)
                    .into_iter()
                    .map(|(style, text)| (style, text.to_string()))
                    .collect()
            })
            .collect()
    }
}

struct PaneShared {
    current: ArcSwapOption<DocumentCalculator>,
    view: Mutex<TextView>,
    generation: AtomicU64,
}

impl PaneShared {
    fn is_current(&self, calculator: &Arc<DocumentCalculator>) -> bool {
        self.current
            .load_full()
            .is_some_and(|current| Arc::ptr_eq(&current, calculator))
    }

    /// UI thread: makes a finished first pass visible, unless superseded.
    fn install(&self, calculator: Arc<DocumentCalculator>) {
        if calculator.is_cancelled() || !self.is_current(&calculator) {
            trace!("discarding superseded log document");
            return;
        }

        let mut view = self.view.lock();
        let pinned = view.at_bottom();
        view.document = calculator.document();
        calculator.mark_installed();
        // Pick up anything published between the first pass and now.
        calculator.update();
        view.fix_scroll(pinned);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// UI thread: appends items that arrived since the last pass.
    fn process_new_items(&self, calculator: &DocumentCalculator) {
        calculator.new_items_started();
        if calculator.is_cancelled() {
            return;
        }
        let mut view = self.view.lock();
        let pinned = view.at_bottom();
        calculator.update();
        view.fix_scroll(pinned);
    }
}

/// Renders a replaceable, possibly large item sequence without blocking the
/// UI thread.
///
/// `set_data` starts a new generation: its first pass runs on the blocking
/// pool and the result is installed on the UI thread only if no newer
/// generation started meanwhile. `update` queues a coalesced catch-up pass
/// for items that arrived later.
#[derive(Clone)]
pub struct ItemTextPane {
    shared: Arc<PaneShared>,
    runtime: Handle,
    ui: UiHandle,
}

impl std::fmt::Debug for ItemTextPane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemTextPane")
            .field("generation", &self.generation())
            .finish()
    }
}

impl ItemTextPane {
    pub fn new(runtime: Handle, ui: UiHandle) -> Self {
        Self {
            shared: Arc::new(PaneShared {
                current: ArcSwapOption::empty(),
                view: Mutex::new(TextView::default()),
                generation: AtomicU64::new(0),
            }),
            runtime,
            ui,
        }
    }

    /// Replaces the displayed items, cancelling any in-flight generation.
    pub fn set_data<I>(&self, items: I)
    where
        I: Iterator<Item = StyledText> + Send + 'static,
    {
        let calculator = Arc::new(DocumentCalculator::new(Box::new(items)));
        if let Some(previous) = self.shared.current.swap(Some(calculator.clone())) {
            previous.cancel();
        }

        let shared = self.shared.clone();
        let ui = self.ui.clone();
        self.runtime.spawn_blocking(move || {
            let appended = calculator.update();
            if calculator.is_cancelled() {
                trace!(appended, "log document superseded during first pass");
                return;
            }
            ui.invoke_later(move || shared.install(calculator));
        });
    }

    /// Requests a catch-up pass over the current items. Lock-free; safe to
    /// call from any thread.
    pub fn update(&self) {
        let Some(calculator) = self.shared.current.load_full() else {
            return;
        };
        if calculator.is_cancelled() || !calculator.is_installed() {
            return;
        }
        if !calculator.request_new_items() {
            return;
        }

        let shared = self.shared.clone();
        self.ui
            .invoke_later(move || shared.process_new_items(&calculator));
    }

    /// Number of generations that became visible.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    pub fn document_text(&self) -> String {
        self.shared.view.lock().text()
    }

    pub fn with_view<R>(&self, f: impl FnOnce(&TextView) -> R) -> R {
        f(&self.shared.view.lock())
    }

    pub fn with_view_mut<R>(&self, f: impl FnOnce(&mut TextView) -> R) -> R {
        f(&mut self.shared.view.lock())
    }
}
