/*
[INPUT]:  LogMessage values from any producer thread
[OUTPUT]: Recorded message history + synchronous observer fan-out
[POS]:    Producer-facing entry point of the log pipeline
[UPDATE]: When changing observer semantics or call-site tagging
*/

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwap;

use crate::append_log::{ExpandableAppendLog, Iter};
use crate::message::{Attachment, LogMessage};

/// Callback run on the logging thread after every recorded message.
///
/// Observers must be fast and must not take locks: they run on whatever
/// thread produced the message.
pub type Observer = Arc<dyn Fn() + Send + Sync>;

/// Token returned by [`LogRecorder::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

#[derive(Default)]
struct Shared {
    log: ExpandableAppendLog<Arc<LogMessage>>,
    observers: ArcSwap<Vec<(ObserverHandle, Observer)>>,
    next_observer: AtomicU64,
    record_calling_class: AtomicBool,
}

/// Records log messages and notifies interested views.
///
/// Cheap to clone; clones share history and observers.
#[derive(Clone, Default)]
pub struct LogRecorder {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for LogRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogRecorder")
            .field("len", &self.len())
            .field("observers", &self.shared.observers.load().len())
            .finish()
    }
}

impl LogRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags messages without a call site with the location of the
    /// `message_logged` caller.
    pub fn set_record_calling_class(&self, enabled: bool) {
        self.shared
            .record_calling_class
            .store(enabled, Ordering::Relaxed);
    }

    pub fn record_calling_class(&self) -> bool {
        self.shared.record_calling_class.load(Ordering::Relaxed)
    }

    /// Records `message` and runs every observer on the current thread.
    #[track_caller]
    pub fn message_logged(&self, message: LogMessage) {
        let message = if self.record_calling_class() && !message.has_call_site() {
            let caller = Location::caller();
            message.with_attachment(Attachment::CallSite {
                file: caller.file().to_string(),
                line: caller.line(),
            })
        } else {
            message
        };

        self.shared.log.add(Arc::new(message));

        let observers = self.shared.observers.load();
        for (_, observer) in observers.iter() {
            observer();
        }
    }

    pub fn add_observer(&self, observer: Observer) -> ObserverHandle {
        let handle = ObserverHandle(self.shared.next_observer.fetch_add(1, Ordering::Relaxed));
        self.shared.observers.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push((handle, observer.clone()));
            next
        });
        handle
    }

    /// Returns `false` if the handle was not registered.
    pub fn remove_observer(&self, handle: ObserverHandle) -> bool {
        let previous = self.shared.observers.rcu(|current| {
            current
                .iter()
                .filter(|(h, _)| *h != handle)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|(h, _)| *h == handle)
    }

    pub fn observer_count(&self) -> usize {
        self.shared.observers.load().len()
    }

    pub fn iter(&self) -> Iter<Arc<LogMessage>> {
        self.shared.log.iter()
    }

    pub fn iter_at_end(&self) -> Iter<Arc<LogMessage>> {
        self.shared.log.iter_at_end()
    }

    /// Ordered, sequential view of the recorded history that keeps growing
    /// as messages arrive.
    pub fn stream(&self) -> impl Iterator<Item = Arc<LogMessage>> + Send + 'static {
        self.iter()
    }

    pub fn clear(&self) {
        self.shared.log.clear();
    }

    pub fn len(&self) -> u64 {
        self.shared.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.log.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::LogLevel;
    use std::sync::atomic::AtomicUsize;

    fn message(text: &str) -> LogMessage {
        LogMessage::new("app::test", LogLevel::Info, text)
    }

    #[test]
    fn observers_run_per_message() {
        let recorder = LogRecorder::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = recorder.add_observer(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        recorder.message_logged(message("one"));
        recorder.message_logged(message("two"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(recorder.remove_observer(handle));
        assert!(!recorder.remove_observer(handle));
        recorder.message_logged(message("three"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.observer_count(), 0);
    }

    #[test]
    fn observer_may_unregister_itself() {
        let recorder = LogRecorder::new();
        let slot: Arc<parking_lot::Mutex<Option<ObserverHandle>>> = Arc::default();
        let inner_recorder = recorder.clone();
        let inner_slot = slot.clone();
        let handle = recorder.add_observer(Arc::new(move || {
            if let Some(handle) = inner_slot.lock().take() {
                inner_recorder.remove_observer(handle);
            }
        }));
        *slot.lock() = Some(handle);

        recorder.message_logged(message("first"));
        assert_eq!(recorder.observer_count(), 0);
    }

    #[test]
    fn stream_yields_messages_in_order() {
        let recorder = LogRecorder::new();
        recorder.message_logged(message("a"));
        recorder.message_logged(message("b"));
        let texts: Vec<_> = recorder.stream().map(|m| m.text().to_string()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn call_site_points_at_caller() {
        let recorder = LogRecorder::new();
        recorder.set_record_calling_class(true);
        let line = line!() + 1;
        recorder.message_logged(message("tagged"));

        let recorded = recorder.iter().next().unwrap();
        assert_eq!(
            recorded.attachments(),
            &[Attachment::CallSite {
                file: file!().to_string(),
                line,
            }]
        );
    }

    #[test]
    fn existing_call_site_is_kept() {
        let recorder = LogRecorder::new();
        recorder.set_record_calling_class(true);
        let site = Attachment::CallSite {
            file: "src/other.rs".to_string(),
            line: 7,
        };
        recorder.message_logged(message("pre-tagged").with_attachment(site.clone()));
        let recorded = recorder.iter().next().unwrap();
        assert_eq!(recorded.attachments(), &[site]);
    }

    #[test]
    fn clear_empties_new_streams() {
        let recorder = LogRecorder::new();
        recorder.message_logged(message("gone"));
        recorder.clear();
        assert!(recorder.is_empty());
        assert_eq!(recorder.stream().count(), 0);
    }
}
