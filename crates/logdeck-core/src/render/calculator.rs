use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::message::StyledText;

use super::Document;

pub(crate) type ItemIter = Box<dyn Iterator<Item = StyledText> + Send>;

/// Materializes one generation of items into its own document.
///
/// The iterator may report exhaustion and later yield more items; every
/// `update()` pass resumes where the previous one stopped.
pub(crate) struct DocumentCalculator {
    items: Mutex<ItemIter>,
    document: Arc<Mutex<Document>>,
    cancelled: AtomicBool,
    installed: AtomicBool,
    waiting_for_new_items: AtomicBool,
}

impl DocumentCalculator {
    pub(crate) fn new(items: ItemIter) -> Self {
        Self {
            items: Mutex::new(items),
            document: Arc::new(Mutex::new(Document::new())),
            cancelled: AtomicBool::new(false),
            installed: AtomicBool::new(false),
            waiting_for_new_items: AtomicBool::new(false),
        }
    }

    pub(crate) fn document(&self) -> Arc<Mutex<Document>> {
        self.document.clone()
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn mark_installed(&self) {
        self.installed.store(true, Ordering::Release);
    }

    pub(crate) fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Claims the single pending catch-up slot. `false` if one is queued.
    pub(crate) fn request_new_items(&self) -> bool {
        !self.waiting_for_new_items.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn new_items_started(&self) {
        self.waiting_for_new_items.store(false, Ordering::Release);
    }

    /// Appends items until the iterator runs dry or the calculator is
    /// cancelled. The flag is checked between items, so one large item is
    /// always copied in full. Returns the number of items appended.
    pub(crate) fn update(&self) -> usize {
        let mut items = self.items.lock();
        let mut appended = 0;

        while !self.is_cancelled() {
            let Some(item) = items.next() else {
                break;
            };
            let mut document = self.document.lock();
            let offset = document.len();
            if let Err(err) = document.insert(offset, &item) {
                debug!(error = %err, "dropping log item that could not be inserted");
                continue;
            }
            appended += 1;
        }

        appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::append_log::ExpandableAppendLog;

    #[test]
    fn resumes_after_iterator_runs_dry() {
        let log = ExpandableAppendLog::new();
        log.add(StyledText::plain("one\n"));
        let calculator = DocumentCalculator::new(Box::new(log.iter()));

        assert_eq!(calculator.update(), 1);
        assert_eq!(calculator.update(), 0);
        log.add(StyledText::plain("two\n"));
        assert_eq!(calculator.update(), 1);
        assert_eq!(calculator.document().lock().text(), "one\ntwo\n");
    }

    #[test]
    fn cancelled_calculator_stops() {
        let items = (0..10).map(|i| StyledText::plain(format!("{i}\n")));
        let calculator = DocumentCalculator::new(Box::new(items));
        calculator.cancel();
        assert_eq!(calculator.update(), 0);
        assert!(calculator.document().lock().is_empty());
    }

    #[test]
    fn catch_up_requests_coalesce() {
        let calculator = DocumentCalculator::new(Box::new(std::iter::empty()));
        assert!(calculator.request_new_items());
        assert!(!calculator.request_new_items());
        calculator.new_items_started();
        assert!(calculator.request_new_items());
    }
}
