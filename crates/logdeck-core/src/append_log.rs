/*
[INPUT]:  Values appended from arbitrary producer threads
[OUTPUT]: Append-only sequence with live positional iterators
[POS]:    Storage layer - lock-free log buffer under LogRecorder
[UPDATE]: When changing key allocation, clear/eviction or iterator semantics
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

#[derive(Debug)]
struct Inner<T> {
    entries: DashMap<u64, T>,
    next_key: AtomicU64,
    first_visible: AtomicU64,
}

/// Append-only sequence keyed by a monotonically increasing counter.
///
/// Writers allocate a key with a single fetch-and-add and publish the value
/// into a concurrent map, so any number of threads may `add` while others
/// iterate. Cloning the log is cheap and yields a handle to the same data.
///
/// `clear()` moves the visible start to the current write head and evicts the
/// entries below it. Iterators positioned before the boundary skip forward to
/// it on their next call.
#[derive(Debug)]
pub struct ExpandableAppendLog<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ExpandableAppendLog<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for ExpandableAppendLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ExpandableAppendLog<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                next_key: AtomicU64::new(0),
                first_visible: AtomicU64::new(0),
            }),
        }
    }

    /// Appends `value` and returns its sequence key.
    pub fn add(&self, value: T) -> u64 {
        let key = self.inner.next_key.fetch_add(1, Ordering::AcqRel);
        self.inner.entries.insert(key, value);
        // A clear may have passed this key between allocation and publish.
        if key < self.inner.first_visible.load(Ordering::Acquire) {
            self.inner.entries.remove(&key);
        }
        key
    }

    /// Keys allocated since the last clear.
    pub fn len(&self) -> u64 {
        let head = self.inner.next_key.load(Ordering::Acquire);
        head.saturating_sub(self.inner.first_visible.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterator over everything visible right now and everything added later.
    pub fn iter(&self) -> Iter<T> {
        Iter {
            inner: self.inner.clone(),
            next_index: self.inner.first_visible.load(Ordering::Acquire),
        }
    }

    /// Iterator that only yields entries added after this call.
    pub fn iter_at_end(&self) -> Iter<T> {
        Iter {
            inner: self.inner.clone(),
            next_index: self.inner.next_key.load(Ordering::Acquire),
        }
    }

    /// Logically truncates history at the current write head.
    pub fn clear(&self) {
        let head = self.inner.next_key.load(Ordering::Acquire);
        let previous = self.inner.first_visible.fetch_max(head, Ordering::AcqRel);
        if previous < head {
            self.inner.entries.retain(|key, _| *key >= head);
        }
    }
}

/// Positional reader over an [`ExpandableAppendLog`].
///
/// Not fused: after `next()` returns `None`, a later call yields the next
/// entry once a writer has published it.
#[derive(Debug)]
pub struct Iter<T> {
    inner: Arc<Inner<T>>,
    next_index: u64,
}

impl<T> Iter<T> {
    fn catch_up(&mut self) {
        let first_visible = self.inner.first_visible.load(Ordering::Acquire);
        if self.next_index < first_visible {
            self.next_index = first_visible;
        }
    }

    /// Re-checks live state; never caches an earlier answer.
    pub fn has_next(&mut self) -> bool {
        self.catch_up();
        self.inner.entries.contains_key(&self.next_index)
    }

    pub fn position(&self) -> u64 {
        self.next_index
    }
}

impl<T: Clone> Iterator for Iter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.catch_up();
        let value = self.inner.entries.get(&self.next_index)?.value().clone();
        self.next_index += 1;
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn live_iterator_sees_new_entries() {
        let log = ExpandableAppendLog::new();
        let mut iter = log.iter();
        assert!(!iter.has_next());
        assert_eq!(iter.next(), None);

        for value in 0..5 {
            log.add(value);
            assert!(iter.has_next());
            assert_eq!(iter.next(), Some(value));
            assert!(!iter.has_next());
        }
    }

    #[test]
    fn iter_at_end_skips_history() {
        let log = ExpandableAppendLog::new();
        log.add("old");
        let mut tail = log.iter_at_end();
        assert!(!tail.has_next());
        log.add("new");
        assert_eq!(tail.collect::<Vec<_>>(), vec!["new"]);
    }

    #[test]
    fn keys_are_dense_and_increasing() {
        let log = ExpandableAppendLog::new();
        assert_eq!(log.add('a'), 0);
        assert_eq!(log.add('b'), 1);
        assert_eq!(log.add('c'), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn clear_hides_history() {
        let log = ExpandableAppendLog::new();
        log.add(1);
        log.add(2);
        log.clear();
        assert!(log.is_empty());
        let mut fresh = log.iter();
        assert!(!fresh.has_next());
        log.add(3);
        assert_eq!(fresh.next(), Some(3));
    }

    #[test]
    fn iterator_created_before_clear_reads_later_entries() {
        let log = ExpandableAppendLog::new();
        log.add(1);
        log.add(2);
        let mut early = log.iter();
        assert_eq!(early.next(), Some(1));

        log.clear();
        // Entry 2 was cleared before this reader got to it.
        assert!(!early.has_next());

        log.add(3);
        log.add(4);
        assert_eq!(early.by_ref().collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(early.position(), 4);
    }

    #[test]
    fn clear_evicts_cleared_entries() {
        let log = ExpandableAppendLog::new();
        for i in 0..10 {
            log.add(i);
        }
        log.clear();
        assert_eq!(log.inner.entries.len(), 0);
        log.add(10);
        assert_eq!(log.inner.entries.len(), 1);
    }

    #[test]
    fn concurrent_writers_keep_key_order() {
        let log = ExpandableAppendLog::new();
        let writers = 8;
        let per_writer = 500;

        let handles: Vec<_> = (0..writers)
            .map(|w| {
                let log = log.clone();
                thread::spawn(move || {
                    for i in 0..per_writer {
                        let key = log.add((w, i));
                        assert!(key < (writers * per_writer) as u64);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let first: Vec<_> = log.iter().collect();
        let second: Vec<_> = log.iter().collect();
        assert_eq!(first.len(), writers * per_writer);
        assert_eq!(first, second);

        // Per-writer order survives interleaving.
        for w in 0..writers {
            let own: Vec<_> = first.iter().filter(|(id, _)| *id == w).map(|(_, i)| *i).collect();
            assert_eq!(own, (0..per_writer).collect::<Vec<_>>());
        }
    }

    #[test]
    fn reader_concurrent_with_writers_never_fails() {
        let log = ExpandableAppendLog::new();
        let writer = {
            let log = log.clone();
            thread::spawn(move || {
                for i in 0..2_000u32 {
                    log.add(i);
                }
            })
        };

        let mut iter = log.iter();
        let mut seen = Vec::new();
        while seen.len() < 2_000 {
            if let Some(value) = iter.next() {
                seen.push(value);
            } else {
                thread::yield_now();
            }
        }
        writer.join().unwrap();
        assert_eq!(seen, (0..2_000).collect::<Vec<_>>());
    }
}
