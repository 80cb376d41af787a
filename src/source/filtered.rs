//! Filtering provider with bidirectional index mapping.
//!
//! Wraps any [`LineProvider`] with a set of allowed levels and an optional
//! case-sensitive substring filter. The forward map (`filtered_indices`)
//! takes a filtered position to its original line; the reverse map is a
//! binary search over it. Filter mutations set a dirty flag and the next
//! read performs a full linear rebuild.
//!
//! When both filter sets are empty the provider is an identity view and the
//! mapping array is not materialized.

use crate::logformat::{Level, LevelDetector};
use crate::source::{Line, LineProvider};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Default)]
struct FilterState {
    levels: BTreeSet<Level>,
    text: Option<String>,
    filtered_indices: Vec<usize>,
    dirty: bool,
}

impl FilterState {
    fn is_filtered(&self) -> bool {
        !self.levels.is_empty() || self.text.is_some()
    }
}

/// A [`LineProvider`] view restricted by level and substring filters.
pub struct FilteredProvider {
    source: Arc<dyn LineProvider>,
    detector: LevelDetector,
    state: RwLock<FilterState>,
}

impl FilteredProvider {
    pub fn new(source: Arc<dyn LineProvider>, detector: LevelDetector) -> Self {
        Self {
            source,
            detector,
            state: RwLock::new(FilterState {
                dirty: true,
                ..FilterState::default()
            }),
        }
    }

    /// Flip membership of a level in the allowed set.
    pub fn toggle_level(&self, level: Level) {
        let mut state = self.state.write();
        if !state.levels.remove(&level) {
            state.levels.insert(level);
        }
        state.dirty = true;
    }

    /// Show only the given level.
    pub fn set_only_level(&self, level: Level) {
        let mut state = self.state.write();
        state.levels = BTreeSet::from([level]);
        state.dirty = true;
    }

    /// Show the given level and everything more severe.
    pub fn set_level_and_above(&self, level: Level) {
        let mut state = self.state.write();
        state.levels = Level::ALL.iter().copied().filter(|l| *l >= level).collect();
        state.dirty = true;
    }

    /// Empty the level set.
    pub fn clear_levels(&self) {
        let mut state = self.state.write();
        state.levels.clear();
        state.dirty = true;
    }

    /// Set the substring filter; an empty string clears it.
    pub fn set_text_filter(&self, text: &str) {
        let mut state = self.state.write();
        state.text = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        state.dirty = true;
    }

    /// Remove the substring filter.
    pub fn clear_text_filter(&self) {
        let mut state = self.state.write();
        state.text = None;
        state.dirty = true;
    }

    /// Remove all filters.
    pub fn clear_all(&self) {
        let mut state = self.state.write();
        state.levels.clear();
        state.text = None;
        state.dirty = true;
    }

    /// Current substring filter, if any.
    pub fn text_filter(&self) -> Option<String> {
        self.state.read().text.clone()
    }

    pub fn has_text_filter(&self) -> bool {
        self.state.read().text.is_some()
    }

    /// True when any filter is active.
    pub fn is_filtered(&self) -> bool {
        self.state.read().is_filtered()
    }

    /// Levels currently allowed, in severity order.
    pub fn active_levels(&self) -> Vec<Level> {
        self.state.read().levels.iter().copied().collect()
    }

    /// Force a rebuild on the next read (used after the source grows).
    pub fn mark_dirty(&self) {
        self.state.write().dirty = true;
    }

    /// Filtered position of an original line, or `None` when the line is
    /// hidden. Identity when no filter is active.
    pub fn filtered_index_for(&self, original: usize) -> Option<usize> {
        self.ensure_rebuilt();
        let state = self.state.read();
        if !state.is_filtered() {
            return if original < self.source.line_count() {
                Some(original)
            } else {
                None
            };
        }
        state.filtered_indices.binary_search(&original).ok()
    }

    fn ensure_rebuilt(&self) {
        let mut state = self.state.write();
        if !state.dirty {
            return;
        }
        state.filtered_indices.clear();

        if state.is_filtered() {
            let total = self.source.line_count();
            for i in 0..total {
                // Unreadable lines are skipped so a truncated or corrupt
                // file still filters as far as it can
                let Some(line) = self.source.get_line(i) else {
                    continue;
                };

                if let Some(text) = &state.text {
                    if !line.content.contains(text.as_str()) {
                        continue;
                    }
                }

                if !state.levels.is_empty() {
                    let level = if line.level != Level::Unknown {
                        line.level
                    } else {
                        self.detector.detect(&line.content)
                    };
                    if !state.levels.contains(&level) {
                        continue;
                    }
                }

                state.filtered_indices.push(i);
            }
        }

        state.dirty = false;
    }
}

impl LineProvider for FilteredProvider {
    fn line_count(&self) -> usize {
        self.ensure_rebuilt();
        let state = self.state.read();
        if state.is_filtered() {
            state.filtered_indices.len()
        } else {
            self.source.line_count()
        }
    }

    fn get_line(&self, index: usize) -> Option<Line> {
        self.ensure_rebuilt();
        let original = {
            let state = self.state.read();
            if !state.is_filtered() {
                return self.source.get_line(index);
            }
            *state.filtered_indices.get(index)?
        };

        let mut line = self.source.get_line(original)?;
        line.original_index = original;
        Some(line)
    }

    fn original_line_number(&self, index: usize) -> Option<usize> {
        self.ensure_rebuilt();
        let state = self.state.read();
        if !state.is_filtered() {
            return if index < self.source.line_count() {
                Some(index)
            } else {
                None
            };
        }
        state.filtered_indices.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevelConfig;
    use crate::source::FileSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn provider(content: &str) -> (NamedTempFile, FilteredProvider) {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        let src = Arc::new(FileSource::open(file.path()).unwrap());
        let detector = LevelDetector::new(&LogLevelConfig::default());
        (file, FilteredProvider::new(src, detector))
    }

    #[test]
    fn test_identity_when_unfiltered() {
        let (_f, p) = provider("a\nb\nc\n");
        assert!(!p.is_filtered());
        assert_eq!(p.line_count(), 3);
        assert_eq!(p.get_line(1).unwrap().content, "b");
        assert_eq!(p.original_line_number(2), Some(2));
        assert_eq!(p.filtered_index_for(2), Some(2));
        assert_eq!(p.filtered_index_for(5), None);
    }

    #[test]
    fn test_level_and_above() {
        let (_f, p) = provider("[INF] hi\n[WRN] hi\n[ERR] hi\n");
        p.set_level_and_above(Level::Warn);

        assert_eq!(p.line_count(), 2);
        assert_eq!(p.original_line_number(0), Some(1));
        assert_eq!(p.original_line_number(1), Some(2));
        assert_eq!(p.filtered_index_for(0), None);
        assert_eq!(p.filtered_index_for(1), Some(0));
    }

    #[test]
    fn test_toggle_and_only() {
        let (_f, p) = provider("[INF] a\n[WRN] b\n[ERR] c\n[INF] d\n");
        p.toggle_level(Level::Info);
        assert_eq!(p.line_count(), 2);

        p.toggle_level(Level::Info);
        assert!(!p.is_filtered());
        assert_eq!(p.line_count(), 4);

        p.set_only_level(Level::Error);
        assert_eq!(p.line_count(), 1);
        assert_eq!(p.get_line(0).unwrap().original_index, 2);
    }

    #[test]
    fn test_text_filter_case_sensitive() {
        let (_f, p) = provider("Connection open\nconnection lost\nretrying\n");
        p.set_text_filter("Connection");
        assert_eq!(p.line_count(), 1);
        assert_eq!(p.original_line_number(0), Some(0));

        // Empty string clears
        p.set_text_filter("");
        assert!(!p.is_filtered());
        assert_eq!(p.line_count(), 3);
    }

    #[test]
    fn test_combined_filters_reject_in_order() {
        let (_f, p) = provider("[ERR] db down\n[ERR] net down\n[WRN] db slow\n");
        p.set_text_filter("db");
        p.set_only_level(Level::Error);

        assert_eq!(p.line_count(), 1);
        assert_eq!(p.get_line(0).unwrap().content, "[ERR] db down");
    }

    #[test]
    fn test_reverse_map_roundtrip() {
        let (_f, p) = provider("[INF] a\n[ERR] b\n[INF] c\n[ERR] d\n[ERR] e\n");
        p.set_only_level(Level::Error);

        for original in 0..5 {
            if let Some(k) = p.filtered_index_for(original) {
                assert_eq!(p.original_line_number(k), Some(original));
            }
        }
        // Visible content matches the source lines it maps to
        for k in 0..p.line_count() {
            let line = p.get_line(k).unwrap();
            assert_eq!(line.original_index, p.original_line_number(k).unwrap());
        }
    }

    #[test]
    fn test_filtered_indices_strictly_increasing() {
        let (_f, p) = provider("[ERR] a\n[INF] b\n[ERR] c\n[ERR] d\n");
        p.set_only_level(Level::Error);

        let originals: Vec<_> = (0..p.line_count())
            .map(|k| p.original_line_number(k).unwrap())
            .collect();
        assert!(originals.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_mark_dirty_picks_up_growth() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[ERR] one\n").unwrap();
        file.flush().unwrap();
        let src = Arc::new(FileSource::open(file.path()).unwrap());
        let p = FilteredProvider::new(
            Arc::clone(&src) as Arc<dyn LineProvider>,
            LevelDetector::new(&LogLevelConfig::default()),
        );
        p.set_only_level(Level::Error);
        assert_eq!(p.line_count(), 1);

        file.write_all(b"[ERR] two\n").unwrap();
        file.flush().unwrap();
        src.refresh().unwrap();

        // Not visible until marked dirty
        assert_eq!(p.line_count(), 1);
        p.mark_dirty();
        assert_eq!(p.line_count(), 2);
    }

    #[test]
    fn test_clear_all() {
        let (_f, p) = provider("[ERR] a\n[INF] b\n");
        p.set_only_level(Level::Error);
        p.set_text_filter("a");
        assert!(p.is_filtered());

        p.clear_all();
        assert!(!p.is_filtered());
        assert_eq!(p.line_count(), 2);
    }
}
