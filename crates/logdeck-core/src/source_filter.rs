/*
[INPUT]:  Discovered log sources, source selection, per-source level edits
[OUTPUT]: Cached (source, level) predicate + flattened tree rows for display
[POS]:    Filter layer - per-source visibility between recorder and formatter
[UPDATE]: When changing selection or bulk-operation semantics
*/

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::message::{LevelSet, LogLevel, LogMessage, LogSource};

/// Visibility of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSettings {
    pub visible: bool,
    pub levels: LevelSet,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            visible: true,
            levels: LevelSet::all(),
        }
    }
}

#[derive(Debug)]
struct TreeNode {
    source: LogSource,
    children: BTreeMap<String, TreeNode>,
}

/// One line of the flattened source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub depth: usize,
    pub source: LogSource,
    pub settings: SourceSettings,
    pub selected: bool,
}

/// Immutable snapshot of the filter state.
#[derive(Debug)]
pub struct SourcePredicate {
    selection: Vec<LogSource>,
    settings: HashMap<LogSource, SourceSettings>,
}

impl SourcePredicate {
    pub fn test(&self, message: &LogMessage) -> bool {
        let source = message.source();
        if !self.selection.is_empty() && !self.selection.iter().any(|s| source.is_within(s)) {
            return false;
        }
        match self.settings.get(source) {
            Some(settings) => settings.visible && settings.levels.contains(message.level()),
            None => true,
        }
    }
}

/// Per-source visibility and level selection over a hierarchy of sources.
///
/// Bulk operations act on the selected sources and everything underneath
/// them; with nothing selected they change nothing.
#[derive(Debug, Default)]
pub struct SourceFilter {
    settings: HashMap<LogSource, SourceSettings>,
    roots: BTreeMap<String, TreeNode>,
    selection: BTreeSet<LogSource>,
    cached: OnceLock<Arc<SourcePredicate>>,
}

impl SourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts unseen sources (and their ancestors) as fully visible.
    /// Returns whether the tree changed.
    pub fn update_sources<I>(&mut self, sources: I) -> bool
    where
        I: IntoIterator<Item = LogSource>,
    {
        let mut changed = false;
        for source in sources {
            if self.settings.contains_key(&source) {
                continue;
            }
            for known in source.ancestry() {
                if self.settings.contains_key(&known) {
                    continue;
                }
                debug!(source = %known, "discovered log source");
                self.settings.insert(known, SourceSettings::default());
            }
            self.insert_node(&source);
            changed = true;
        }
        if changed {
            self.invalidate();
        }
        changed
    }

    fn insert_node(&mut self, source: &LogSource) {
        let mut level = &mut self.roots;
        let mut path = String::new();
        for segment in source.segments() {
            if !path.is_empty() {
                path.push_str("::");
            }
            path.push_str(segment);
            let node = level.entry(segment.to_string()).or_insert_with(|| TreeNode {
                source: LogSource::new(&path),
                children: BTreeMap::new(),
            });
            level = &mut node.children;
        }
    }

    pub fn contains(&self, source: &LogSource) -> bool {
        self.settings.contains_key(source)
    }

    pub fn settings(&self, source: &LogSource) -> Option<SourceSettings> {
        self.settings.get(source).copied()
    }

    pub fn selection(&self) -> &BTreeSet<LogSource> {
        &self.selection
    }

    /// Replaces the selection.
    pub fn select<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = LogSource>,
    {
        self.selection = sources.into_iter().collect();
        self.invalidate();
    }

    pub fn toggle_selected(&mut self, source: &LogSource) {
        if !self.selection.remove(source) {
            self.selection.insert(source.clone());
        }
        self.invalidate();
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.invalidate();
        }
    }

    pub fn show_all(&mut self) {
        self.apply_to_selection(|s| *s = SourceSettings::default());
    }

    pub fn hide_all(&mut self) {
        self.apply_to_selection(|s| s.visible = false);
    }

    /// Shows `Error..=level` and hides everything more verbose.
    pub fn show_up_to(&mut self, level: LogLevel) {
        self.apply_to_selection(|s| {
            s.visible = true;
            s.levels = LevelSet::up_to(level);
        });
    }

    pub fn show_level(&mut self, level: LogLevel) {
        self.apply_to_selection(|s| {
            s.visible = true;
            s.levels = s.levels.with(level);
        });
    }

    pub fn hide_level(&mut self, level: LogLevel) {
        self.apply_to_selection(|s| s.levels = s.levels.without(level));
    }

    fn apply_to_selection(&mut self, edit: impl Fn(&mut SourceSettings)) {
        if self.selection.is_empty() {
            return;
        }
        let selection = &self.selection;
        for (source, settings) in self.settings.iter_mut() {
            if selection.iter().any(|selected| source.is_within(selected)) {
                edit(settings);
            }
        }
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.cached.take();
    }

    /// Cached predicate; rebuilt on first use after any mutation.
    pub fn filter(&self) -> Arc<SourcePredicate> {
        self.cached
            .get_or_init(|| {
                Arc::new(SourcePredicate {
                    selection: self.selection.iter().cloned().collect(),
                    settings: self.settings.clone(),
                })
            })
            .clone()
    }

    /// Depth-first rows of the source tree.
    pub fn rows(&self) -> Vec<SourceRow> {
        let mut rows = Vec::with_capacity(self.settings.len());
        for node in self.roots.values() {
            self.push_rows(node, 0, &mut rows);
        }
        rows
    }

    fn push_rows(&self, node: &TreeNode, depth: usize, rows: &mut Vec<SourceRow>) {
        rows.push(SourceRow {
            depth,
            source: node.source.clone(),
            settings: self.settings.get(&node.source).copied().unwrap_or_default(),
            selected: self.selection.contains(&node.source),
        });
        for child in node.children.values() {
            self.push_rows(child, depth + 1, rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(source: &str, level: LogLevel) -> LogMessage {
        LogMessage::new(source, level, "text")
    }

    fn filter_with(sources: &[&str]) -> SourceFilter {
        let mut filter = SourceFilter::new();
        filter.update_sources(sources.iter().map(|s| LogSource::new(s)));
        filter
    }

    #[test]
    fn unknown_sources_pass() {
        let filter = filter_with(&["db::pool"]);
        assert!(filter.filter().test(&msg("never::seen", LogLevel::Trace)));
    }

    #[test]
    fn discovered_sources_default_visible() {
        let mut filter = SourceFilter::new();
        assert!(filter.update_sources([LogSource::new("a::b::c")]));
        assert!(!filter.update_sources([LogSource::new("a::b::c")]));
        for name in ["a", "a::b", "a::b::c"] {
            assert_eq!(filter.settings(&LogSource::new(name)), Some(SourceSettings::default()));
        }
    }

    #[test]
    fn filter_is_cached_until_mutation() {
        let mut filter = filter_with(&["net"]);
        let first = filter.filter();
        let second = filter.filter();
        assert!(Arc::ptr_eq(&first, &second));

        filter.select([LogSource::new("net")]);
        let third = filter.filter();
        assert!(!Arc::ptr_eq(&first, &third));
        assert!(Arc::ptr_eq(&third, &filter.filter()));
    }

    #[test]
    fn bulk_ops_without_selection_do_nothing() {
        let mut filter = filter_with(&["net"]);
        let before = filter.filter();
        filter.hide_all();
        assert!(Arc::ptr_eq(&before, &filter.filter()));
        assert!(filter.filter().test(&msg("net", LogLevel::Info)));
    }

    #[test]
    fn show_up_to_limits_levels() {
        let mut filter = filter_with(&["net::http", "db"]);
        filter.select([LogSource::new("net")]);
        filter.show_up_to(LogLevel::Warn);
        filter.clear_selection();

        let predicate = filter.filter();
        assert!(predicate.test(&msg("net::http", LogLevel::Error)));
        assert!(predicate.test(&msg("net::http", LogLevel::Warn)));
        assert!(!predicate.test(&msg("net::http", LogLevel::Info)));
        assert!(predicate.test(&msg("db", LogLevel::Trace)));
    }

    #[test]
    fn hide_all_then_show_level() {
        let mut filter = filter_with(&["net"]);
        filter.select([LogSource::new("net")]);
        filter.hide_all();
        filter.clear_selection();
        assert!(!filter.filter().test(&msg("net", LogLevel::Error)));

        filter.select([LogSource::new("net")]);
        filter.hide_level(LogLevel::Debug);
        filter.show_level(LogLevel::Info);
        filter.clear_selection();
        let predicate = filter.filter();
        assert!(predicate.test(&msg("net", LogLevel::Info)));
        assert!(!predicate.test(&msg("net", LogLevel::Debug)));
    }

    #[test]
    fn selection_restricts_to_subtree() {
        let mut filter = filter_with(&["net::http", "net::dns", "db"]);
        filter.select([LogSource::new("net::http")]);
        let predicate = filter.filter();
        assert!(predicate.test(&msg("net::http", LogLevel::Info)));
        assert!(predicate.test(&msg("net::http::client", LogLevel::Info)));
        assert!(!predicate.test(&msg("net::dns", LogLevel::Info)));
        assert!(!predicate.test(&msg("unknown", LogLevel::Info)));
    }

    #[test]
    fn toggle_selection() {
        let mut filter = filter_with(&["db"]);
        let db = LogSource::new("db");
        filter.toggle_selected(&db);
        assert!(filter.selection().contains(&db));
        filter.toggle_selected(&db);
        assert!(filter.selection().is_empty());
    }

    #[test]
    fn rows_follow_tree_order() {
        let mut filter = filter_with(&["net::http", "db", "net::dns"]);
        filter.select([LogSource::new("db")]);
        let rows: Vec<_> = filter
            .rows()
            .into_iter()
            .map(|r| (r.depth, r.source.to_string(), r.selected))
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, "db".to_string(), true),
                (0, "net".to_string(), false),
                (1, "net::dns".to_string(), false),
                (1, "net::http".to_string(), false),
            ]
        );
    }
}
